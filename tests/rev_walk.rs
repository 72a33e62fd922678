use bit_repo::{Error, ObjectId, ObjectType, RevWalk, SortMode, WalkStep};
use common::history::History;
use common::{linear_history, merge_history, same_second_history};
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;

#[rstest]
fn linear_walk_yields_newest_first(linear_history: History) -> Result<(), Box<dyn std::error::Error>> {
    let repository = linear_history.repository();
    let walk = repository.walk(Some(&linear_history.id("d")), SortMode::NONE)?;

    assert_eq!(linear_history.labels(walk), ["d", "c", "b", "a"]);

    Ok(())
}

#[rstest]
fn linear_walk_stops_at_hidden_commit(linear_history: History) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(linear_history.repository().refs());
    walk.push_head()?;
    walk.hide(&linear_history.id("b"))?;

    assert_eq!(linear_history.labels(walk), ["d", "c"]);

    Ok(())
}

#[rstest]
fn hiding_the_pushed_commit_yields_nothing(linear_history: History) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(linear_history.repository().refs());
    walk.push(&linear_history.id("c"))?;
    walk.hide(&linear_history.id("c"))?;

    assert!(walk.next_step()?.is_end());

    Ok(())
}

#[rstest]
#[case(SortMode::NONE, &["m", "y", "c", "x", "b", "a"])]
#[case(SortMode::TIME, &["m", "y", "c", "x", "b", "a"])]
#[case(SortMode::TOPOLOGICAL, &["m", "c", "y", "x", "b", "a"])]
#[case(SortMode::TIME | SortMode::REVERSE, &["a", "b", "x", "c", "y", "m"])]
#[case(SortMode::TOPOLOGICAL | SortMode::REVERSE, &["a", "b", "x", "y", "c", "m"])]
fn merge_walk_order(
    merge_history: History,
    #[case] mode: SortMode,
    #[case] expected: &[&str],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(merge_history.repository().refs());
    walk.sort(mode);
    walk.push_ref("refs/heads/main")?;

    assert_eq!(merge_history.labels(walk), expected);

    Ok(())
}

#[rstest]
fn first_parent_walk_skips_merged_branch(merge_history: History) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(merge_history.repository().refs());
    walk.simplify_first_parent();
    walk.push_head()?;

    assert_eq!(merge_history.labels(walk), ["m", "c", "b", "a"]);

    Ok(())
}

#[rstest]
fn branch_range_walk(merge_history: History) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(merge_history.repository().refs());
    walk.push_ref("refs/heads/main")?;
    walk.hide_ref("refs/heads/feature")?;

    assert_eq!(merge_history.labels(walk), ["m", "c"]);

    Ok(())
}

#[rstest]
fn revision_expressions_select_start_points(merge_history: History) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(merge_history.repository().refs());
    walk.push_revision("main~1")?;
    walk.hide_revision("feature^")?;

    assert_eq!(merge_history.labels(walk), ["c"]);

    Ok(())
}

#[rstest]
fn end_of_walk_is_not_an_error(linear_history: History) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(linear_history.repository().refs());
    walk.push(&linear_history.id("a"))?;

    assert!(matches!(walk.next_step()?, WalkStep::Commit(_)));
    assert!(walk.next_step()?.is_end());
    assert!(walk.next_step()?.is_end());

    Ok(())
}

#[rstest]
fn reset_keeps_sorting_and_first_parent(merge_history: History) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(merge_history.repository().refs());
    walk.sort(SortMode::TIME | SortMode::REVERSE);
    walk.simplify_first_parent();
    walk.push_head()?;
    while !walk.next_step()?.is_end() {}

    walk.reset();
    assert_eq!(walk.sorting(), SortMode::TIME | SortMode::REVERSE);

    walk.push(&merge_history.id("m"))?;
    assert_eq!(merge_history.labels(walk), ["a", "b", "c", "m"]);

    Ok(())
}

#[rstest]
fn walk_from_annotated_tag_starts_at_its_commit(merge_history: History) -> Result<(), Box<dyn std::error::Error>> {
    let tag_id = merge_history.annotated_tag("v1.0", "c");

    let walk = merge_history.repository().walk(Some(&tag_id), SortMode::NONE)?;

    assert_eq!(merge_history.labels(walk), ["c", "b", "a"]);

    Ok(())
}

#[rstest]
fn pushing_a_blob_fails(linear_history: History) {
    let repository = linear_history.repository();
    let blob_id = ObjectId::hash_object(ObjectType::Blob, b"a\n");
    assert!(repository.database().contains(&blob_id).unwrap());

    let mut walk = RevWalk::new(repository.refs());
    let err = walk.push(&blob_id).unwrap_err();

    assert!(matches!(err, Error::CannotPeel { .. } | Error::TypeMismatch { .. }));
}

#[rstest]
fn pushing_a_missing_commit_fails(linear_history: History) {
    let mut walk = RevWalk::new(linear_history.repository().refs());
    let missing = ObjectId::hash_object(ObjectType::Commit, b"nothing");

    assert!(walk.push(&missing).unwrap_err().is_not_found());
}

#[rstest]
#[case(SortMode::NONE, &["p"])]
#[case(SortMode::TOPOLOGICAL, &["p"])]
#[case(SortMode::REVERSE, &["p"])]
fn hidden_line_excludes_shared_ancestor_at_equal_times(
    same_second_history: History,
    #[case] mode: SortMode,
    #[case] expected: &[&str],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(same_second_history.repository().refs());
    walk.sort(mode);
    walk.push(&same_second_history.id("p"))?;
    walk.hide(&same_second_history.id("h3"))?;

    assert_eq!(same_second_history.labels(walk), expected);

    Ok(())
}

#[rstest]
#[case(SortMode::NONE, &["m", "p"])]
#[case(SortMode::TOPOLOGICAL, &["m", "p"])]
#[case(SortMode::TOPOLOGICAL | SortMode::REVERSE, &["p", "m"])]
fn branch_range_at_equal_times(
    same_second_history: History,
    #[case] mode: SortMode,
    #[case] expected: &[&str],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(same_second_history.repository().refs());
    walk.sort(mode);
    walk.push_ref("refs/heads/main")?;
    walk.hide_ref("refs/heads/topic")?;

    assert_eq!(same_second_history.labels(walk), expected);

    Ok(())
}

#[rstest]
fn hidden_commit_older_than_its_parent() -> Result<(), Box<dyn std::error::Error>> {
    common::init_tracing();
    let mut history = History::in_memory();
    history.commit("a", 100, "");
    history.commit("b", 200, "a");
    history.commit("skewed", 50, "b");
    history.commit("side", 300, "a");

    let mut walk = RevWalk::new(history.repository().refs());
    walk.push(&history.id("side"))?;
    walk.hide(&history.id("skewed"))?;

    assert_eq!(history.labels(walk), ["side"]);

    Ok(())
}

#[rstest]
fn hide_while_streaming_drops_unvisited_ancestors(linear_history: History) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(linear_history.repository().refs());
    walk.push(&linear_history.id("d"))?;

    let first = walk.next_step()?.into_commit().expect("d comes first");
    assert_eq!(first.id(), linear_history.id("d"));

    walk.hide(&linear_history.id("b"))?;
    assert_eq!(linear_history.labels(walk), ["c"]);

    Ok(())
}

#[rstest]
fn hide_during_topological_walk_drops_buffered_commits(
    linear_history: History,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(linear_history.repository().refs());
    walk.sort(SortMode::TOPOLOGICAL);
    walk.push(&linear_history.id("d"))?;

    let first = walk.next_step()?.into_commit().expect("d comes first");
    assert_eq!(first.id(), linear_history.id("d"));

    walk.hide(&linear_history.id("c"))?;
    assert!(walk.next_step()?.is_end());

    Ok(())
}

#[rstest]
fn adding_to_a_finished_walk_fails(linear_history: History) -> Result<(), Box<dyn std::error::Error>> {
    let mut walk = RevWalk::new(linear_history.repository().refs());
    walk.push(&linear_history.id("b"))?;
    while !walk.next_step()?.is_end() {}

    assert!(matches!(walk.push(&linear_history.id("d")), Err(Error::WalkEnded)));
    assert!(matches!(walk.hide(&linear_history.id("a")), Err(Error::WalkEnded)));

    walk.reset();
    walk.push(&linear_history.id("d"))?;
    assert_eq!(linear_history.labels(walk), ["d", "c", "b", "a"]);

    Ok(())
}
