use crate::common::random_signature;
use bit_repo::{
    Blob, Commit, EntryMode, ObjectId, ObjectType, Repository, Tag, Tree, TreeEntry,
};
use std::collections::HashMap;

/// A repository plus the labels its commits were built under
pub struct History {
    repository: Repository,
    ids: HashMap<String, ObjectId>,
}

impl History {
    pub fn in_memory() -> Self {
        Self::over(Repository::in_memory())
    }

    pub fn over(repository: Repository) -> Self {
        History {
            repository,
            ids: HashMap::new(),
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Write a commit labelled `label` on top of the space-separated `parents` labels
    ///
    /// Each commit gets a tree holding one file named after the label.
    pub fn commit(&mut self, label: &str, time: i64, parents: &str) -> ObjectId {
        let database = self.repository.database();

        let blob_id = database
            .write(&Blob::new(format!("{label}\n")))
            .expect("blob is written");
        let tree = Tree::new(vec![TreeEntry::new(
            format!("{label}.txt"),
            EntryMode::Regular,
            blob_id,
        )])
        .expect("tree is valid");
        let tree_id = database.write(&tree).expect("tree is written");

        let parents = parents.split_whitespace().map(|parent| self.id(parent)).collect();
        let signature = random_signature(time);
        let commit = Commit::new(
            tree_id,
            parents,
            signature.clone(),
            signature,
            &format!("{label}\n"),
            None,
        )
        .expect("commit is valid");
        let oid = database.write(&commit).expect("commit is written");

        self.ids.insert(label.to_string(), oid);
        oid
    }

    /// Point `refs/heads/<name>` at the commit labelled `label`
    pub fn branch(&self, name: &str, label: &str) {
        self.repository
            .refs()
            .create_direct(&format!("refs/heads/{name}"), self.id(label), true)
            .expect("branch is created");
    }

    /// Point `HEAD` at `refs/heads/<name>`
    pub fn checkout(&self, name: &str) {
        self.repository
            .refs()
            .create_symbolic("HEAD", &format!("refs/heads/{name}"), true)
            .expect("HEAD is updated");
    }

    /// Lightweight tag on the commit labelled `label`
    pub fn lightweight_tag(&self, name: &str, label: &str) {
        self.repository
            .refs()
            .create_direct(&format!("refs/tags/{name}"), self.id(label), false)
            .expect("tag is created");
    }

    /// Annotated tag object on the commit labelled `label`, plus its reference
    pub fn annotated_tag(&self, name: &str, label: &str) -> ObjectId {
        let tag = Tag::new(
            self.id(label),
            ObjectType::Commit,
            name,
            Some(random_signature(50_000)),
            &format!("release {name}\n"),
        )
        .expect("tag is valid");
        let tag_id = self
            .repository
            .database()
            .write(&tag)
            .expect("tag is written");

        self.repository
            .refs()
            .create_direct(&format!("refs/tags/{name}"), tag_id, false)
            .expect("tag reference is created");

        tag_id
    }

    pub fn id(&self, label: &str) -> ObjectId {
        *self
            .ids
            .get(label)
            .unwrap_or_else(|| panic!("no commit labelled {label}"))
    }

    pub fn label(&self, oid: &ObjectId) -> &str {
        self.ids
            .iter()
            .find_map(|(label, id)| (id == oid).then_some(label.as_str()))
            .unwrap_or_else(|| panic!("no label for {oid}"))
    }

    /// Labels of the commits a walk yields, in order
    pub fn labels(&self, commits: impl IntoIterator<Item = bit_repo::Result<Commit>>) -> Vec<&str> {
        commits
            .into_iter()
            .map(|commit| self.label(&commit.expect("walk step succeeds").id()))
            .collect()
    }
}
