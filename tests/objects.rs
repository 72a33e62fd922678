use bit_repo::{
    Blob, Commit, Error, KindFilter, Object, ObjectId, ObjectType, Repository, Signature, Tag,
};
use common::history::History;
use common::{linear_history, random_signature};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use std::collections::HashMap;

mod common;

proptest! {
    #[test]
    fn hex_round_trips(raw in prop::array::uniform20(any::<u8>())) {
        let oid = ObjectId::from_raw(&raw).unwrap();

        prop_assert_eq!(ObjectId::try_parse(&oid.hex()).unwrap(), oid);
        prop_assert_eq!(oid.as_bytes(), &raw);
    }

    #[test]
    fn ordering_follows_raw_bytes(
        left in prop::array::uniform20(any::<u8>()),
        right in prop::array::uniform20(any::<u8>())
    ) {
        let left_oid = ObjectId::from_raw(&left).unwrap();
        let right_oid = ObjectId::from_raw(&right).unwrap();

        prop_assert_eq!(left_oid.cmp(&right_oid), left.cmp(&right));
        prop_assert_eq!(left_oid == right_oid, left == right);
    }
}

#[rstest]
fn expand_finds_unique_prefix(linear_history: History) -> Result<(), Box<dyn std::error::Error>> {
    let database = linear_history.repository().database();
    let oid = linear_history.id("c");

    assert_eq!(database.expand(&oid.hex()[..12])?, oid);
    assert_eq!(database.expand(&oid.hex())?, oid);

    Ok(())
}

#[rstest]
fn expand_reports_missing_prefix(linear_history: History) {
    let database = linear_history.repository().database();
    let absent = ObjectId::hash_object(ObjectType::Blob, b"never written").hex();

    let err = database.expand(&absent[..10]).unwrap_err();

    assert!(err.is_not_found());
}

#[test]
fn expand_reports_ambiguous_prefix() {
    let repository = Repository::in_memory();
    let database = repository.database();

    let mut seen = HashMap::new();
    let prefix = (0..5000)
        .find_map(|i| {
            let oid = database.write(&Blob::new(format!("blob {i}\n"))).unwrap();
            seen.insert(oid.hex()[..4].to_string(), oid)
                .map(|_| oid.hex()[..4].to_string())
        })
        .expect("5000 blobs share a 4-digit prefix");

    assert!(matches!(
        database.expand(&prefix),
        Err(Error::Ambiguous { candidates, .. }) if candidates >= 2
    ));
}

#[rstest]
#[case("abc", 3)]
#[case("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", 41)]
fn expand_rejects_bad_lengths(linear_history: History, #[case] prefix: &str, #[case] len: usize) {
    let database = linear_history.repository().database();

    assert!(matches!(database.expand(prefix), Err(Error::InvalidLength(l)) if l == len));
}

#[rstest]
fn lookup_checks_kind(linear_history: History) -> Result<(), Box<dyn std::error::Error>> {
    let database = linear_history.repository().database();
    let oid = linear_history.id("a");

    assert_eq!(database.lookup(&oid, KindFilter::Any)?.kind(), ObjectType::Commit);
    assert!(matches!(
        database.lookup(&oid, KindFilter::Only(ObjectType::Tree)),
        Err(Error::TypeMismatch { expected: ObjectType::Tree, actual: ObjectType::Commit, .. })
    ));
    assert!(matches!(
        database.lookup_prefix(&oid.hex()[..8], KindFilter::Only(ObjectType::Commit))?,
        Object::Commit(_)
    ));

    Ok(())
}

#[rstest]
fn commit_exposes_parents_and_tree(linear_history: History) -> Result<(), Box<dyn std::error::Error>> {
    let database = linear_history.repository().database();
    let commit = database.lookup_commit(&linear_history.id("c"))?;

    assert_eq!(commit.parent_ids(), [linear_history.id("b")]);
    let parents = commit.parents(database)?;
    assert_eq!(parents[0].id(), linear_history.id("b"));
    assert_eq!(commit.commit_time(), 3_000);
    assert_eq!(commit.message()?, "c\n");

    let tree = commit.tree(database)?;
    let entry = tree.get_path(database, "c.txt")?;
    let blob = entry.to_object(database)?.into_blob()?;
    assert_eq!(blob.data(), b"c\n");
    assert!(tree.get_path(database, "missing.txt").unwrap_err().is_not_found());

    Ok(())
}

#[rstest]
fn raw_message_decodes_to_message(linear_history: History) -> Result<(), Box<dyn std::error::Error>> {
    let database = linear_history.repository().database();
    let base = database.lookup_commit(&linear_history.id("d"))?;
    let author = random_signature(5_000);

    let commit = Commit::new(
        base.tree_id(),
        vec![base.id()],
        author.clone(),
        author,
        "Grüße aus Köln\n",
        Some("ISO-8859-1"),
    )?;
    let oid = database.write(&commit)?;
    let stored = database.lookup_commit(&oid)?;

    assert_eq!(stored.message_encoding(), Some("ISO-8859-1"));
    assert_eq!(stored.raw_message(), b"Gr\xfc\xdfe aus K\xf6ln\n");
    assert_eq!(stored.message()?, "Grüße aus Köln\n");

    Ok(())
}

#[rstest]
fn annotated_tag_peels_to_commit_and_tree(linear_history: History) -> Result<(), Box<dyn std::error::Error>> {
    let database = linear_history.repository().database();
    let tag_id = linear_history.annotated_tag("v1.0", "b");

    let tag: Tag = database.lookup(&tag_id, KindFilter::Only(ObjectType::Tag))?.into_tag()?;
    assert_eq!(tag.name(), "v1.0");
    assert_eq!(tag.target_id(), linear_history.id("b"));
    assert!(tag.tagger().is_some());

    let commit = Object::from(tag.clone()).peel(database, ObjectType::Commit)?;
    assert_eq!(commit.id(), linear_history.id("b"));

    let tree = Object::from(tag).peel(database, ObjectType::Tree)?;
    assert_eq!(tree.id(), database.lookup_commit(&linear_history.id("b"))?.tree_id());

    Ok(())
}

#[rstest]
fn blob_cannot_peel(linear_history: History) {
    let database = linear_history.repository().database();
    let blob = database
        .lookup(&ObjectId::hash_object(ObjectType::Blob, b"a\n"), KindFilter::Any)
        .unwrap();

    assert!(matches!(
        blob.peel(database, ObjectType::Commit),
        Err(Error::CannotPeel { kind: ObjectType::Blob, target: ObjectType::Commit, .. })
    ));
}

#[rstest]
fn revparse_resolves_expressions(linear_history: History) -> Result<(), Box<dyn std::error::Error>> {
    let repository = linear_history.repository();
    let short_c = linear_history.id("c").short();

    assert_eq!(repository.revparse_single("HEAD~2")?.id(), linear_history.id("b"));
    assert_eq!(repository.revparse_single("main^^^")?.id(), linear_history.id("a"));
    assert_eq!(repository.revparse_single(&format!("{short_c}^"))?.id(), linear_history.id("b"));
    assert!(repository.revparse_single("a~1").unwrap_err().is_not_found());
    assert!(repository.revparse_single("HEAD~4").unwrap_err().is_not_found());

    Ok(())
}

#[test]
fn signature_renders_git_header() -> Result<(), Box<dyn std::error::Error>> {
    let signature = Signature::new("Ada Lovelace", "ada@example.com", 1_700_000_000, 60)?;

    assert_eq!(signature.to_string(), "Ada Lovelace <ada@example.com> 1700000000 +0100");
    assert_eq!(Signature::parse(&signature.to_string())?, signature);
    assert_eq!(signature.when().to_rfc3339(), "2023-11-14T23:13:20+01:00");

    Ok(())
}
