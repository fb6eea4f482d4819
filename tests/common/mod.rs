//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use git2::{IndexEntry, IndexTime, Oid, Repository, Signature};

/// File mode git records for a submodule pointer.
const GITLINK_MODE: u32 = 0o160000;

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        configure_identity(&repo);
        Self { dir, repo }
    }

    /// Working-tree root.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create a commit with the given message. Returns the commit OID.
    pub fn commit(&self, message: &str) -> Oid {
        commit_file(&self.repo, self.path(), "test.txt", message, message)
    }

    /// Write `path` with `content`, stage it and commit. Returns the commit OID.
    pub fn commit_file(&self, path: &str, content: &str, message: &str) -> Oid {
        commit_file(&self.repo, self.path(), path, content, message)
    }

    /// Write `path` with `content` and stage it without committing.
    pub fn stage_file(&self, path: &str, content: &str) {
        write_file(self.path(), path, content);
        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new(path)).expect("Failed to add file");
        index.write().expect("Failed to write index");
    }

    /// Write `path` with `content` without staging it.
    pub fn write_unstaged(&self, path: &str, content: &str) {
        write_file(self.path(), path, content);
    }

    /// Point the index entry at `path` to commit `oid` as a submodule.
    pub fn stage_gitlink(&self, path: &str, oid: Oid) {
        let entry = IndexEntry {
            ctime: IndexTime::new(0, 0),
            mtime: IndexTime::new(0, 0),
            dev: 0,
            ino: 0,
            mode: GITLINK_MODE,
            uid: 0,
            gid: 0,
            file_size: 0,
            id: oid,
            flags: 0,
            flags_extended: 0,
            path: path.as_bytes().to_vec(),
        };

        let mut index = self.repo.index().expect("Failed to get index");
        index.add(&entry).expect("Failed to add gitlink");
        index.write().expect("Failed to write index");
    }

    /// Commit whatever is currently in the index. Returns the commit OID.
    pub fn commit_index(&self, message: &str) -> Oid {
        commit_index(&self.repo, message)
    }

    /// Set the `origin` remote URL.
    pub fn set_origin(&self, url: &str) {
        self.repo
            .remote("origin", url)
            .expect("Failed to create origin remote");
    }

    /// Detach HEAD at the given commit.
    pub fn detach_head(&self, oid: Oid) {
        self.repo.set_head_detached(oid).expect("Failed to detach HEAD");
    }

    /// Initialise a separate repository at `relative` inside this working tree.
    pub fn nested_repo(&self, relative: &str) -> NestedRepo {
        let root = self.path().join(relative);
        std::fs::create_dir_all(&root).expect("Failed to create nested directory");
        let repo = Repository::init(&root).expect("Failed to init nested repo");
        configure_identity(&repo);
        NestedRepo { root, repo }
    }

    /// Register `path` in `.gitmodules` and stage the file.
    pub fn stage_gitmodules_entry(&self, path: &str, url: &str) {
        let content = format!("[submodule \"{path}\"]\n\tpath = {path}\n\turl = {url}\n");
        self.stage_file(".gitmodules", &content);
    }
}

/// A repository living inside another test repository's working tree.
pub struct NestedRepo {
    pub root: PathBuf,
    pub repo: Repository,
}

impl NestedRepo {
    /// Commit a change to `file.txt` with the given message. Returns the commit OID.
    pub fn commit(&self, message: &str) -> Oid {
        commit_file(&self.repo, &self.root, "file.txt", message, message)
    }

    /// Abbreviated id of `oid`, as `git diff --submodule=log` prints it.
    pub fn short_id(&self, oid: Oid) -> String {
        oid.to_string()[..7].to_string()
    }
}

fn configure_identity(repo: &Repository) {
    let mut config = repo.config().expect("Failed to open repo config");
    config
        .set_str("user.name", "Test User")
        .expect("Failed to set user.name");
    config
        .set_str("user.email", "test@example.com")
        .expect("Failed to set user.email");
}

fn signature() -> Signature<'static> {
    Signature::now("Test User", "test@example.com").expect("Failed to create signature")
}

fn write_file(root: &Path, path: &str, content: &str) {
    let full = root.join(path);
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    std::fs::write(full, content).expect("Failed to write test file");
}

fn commit_file(repo: &Repository, root: &Path, path: &str, content: &str, message: &str) -> Oid {
    write_file(root, path, content);

    let mut index = repo.index().expect("Failed to get index");
    index.add_path(Path::new(path)).expect("Failed to add file");
    index.write().expect("Failed to write index");

    commit_index(repo, message)
}

fn commit_index(repo: &Repository, message: &str) -> Oid {
    let sig = signature();

    let mut index = repo.index().expect("Failed to get index");
    let tree_id = index.write_tree().expect("Failed to write tree");
    let tree = repo.find_tree(tree_id).expect("Failed to find tree");

    // Get parent commit if exists
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .expect("Failed to create commit")
}
