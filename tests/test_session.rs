use query_filter::config::default_config;
use query_filter::filter::{FilterGroup, Operator};
use query_filter::session::{
    CatalogSuggestions, DataSource, Session, SessionContext, Stage, TagEvent, drive,
};

#[test]
fn test_update_tag_reopens_chip_for_editing() {
    let mut session = Session::with_group(
        SessionContext::default(),
        FilterGroup::from_tokens(["env = prod", "status EXISTS"]),
    );
    let id = session.group().items[0].id.clone();

    session.update_tag(&id);

    let state = session.state();
    assert_eq!(state.stage(), Stage::Value);
    assert_eq!(state.committed_key(), Some("env"));
    assert_eq!(state.committed_operator(), Some(Operator::Equal));
    assert_eq!(state.pending_value(), "prod");
    assert_eq!(session.tags(), vec!["status EXISTS"]);

    // Replace the value and commit again
    session.handle(TagEvent::Input("env = staging".into()));
    session.handle(TagEvent::Commit);
    assert_eq!(session.tags(), vec!["status EXISTS", "env = staging"]);
}

#[test]
fn test_removing_one_of_three_keeps_order() {
    let mut session = Session::with_group(
        SessionContext::default(),
        FilterGroup::from_tokens(["a = 1", "b IN x, y", "c NOT_EXISTS"]),
    );
    let before: Vec<_> = session.group().items.clone();

    let removed = session.remove_tag(&before[1].id).expect("filter exists");
    assert_eq!(removed.key.raw(), "b");

    let after = &session.group().items;
    assert_eq!(after.len(), 2);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[1], before[2]);
}

#[test]
fn test_building_a_multi_value_filter_with_suggestions() {
    let source = CatalogSuggestions::from_config(default_config());
    let mut session = Session::new(SessionContext {
        data_source: DataSource::Traces,
    });

    drive(&mut session, &source, TagEvent::Input("resource_serv".into()));
    assert!(
        session
            .options()
            .iter()
            .any(|s| s.value == "resource_service_name")
    );

    drive(&mut session, &source, TagEvent::Select("resource_service_name".into()));
    assert_eq!(session.state().stage(), Stage::Operator);

    drive(&mut session, &source, TagEvent::Select("resource_service_name IN".into()));
    assert_eq!(session.state().stage(), Stage::Value);
    assert!(session.is_multi());

    drive(&mut session, &source, TagEvent::Input("resource_service_name IN ca".into()));
    let options: Vec<_> = session.options().into_iter().map(|s| s.value).collect();
    assert_eq!(options, vec!["cart"]);

    drive(&mut session, &source, TagEvent::Select("cart".into()));
    assert!(session.state().is_accumulating());
    assert_eq!(session.state().accumulated_values(), ["cart"]);

    session.handle(TagEvent::Commit);
    assert_eq!(session.tags(), vec!["resource_service_name IN cart"]);
    assert_eq!(session.state().stage(), Stage::Key);
}

#[test]
fn test_cancel_discards_partial_input() {
    let mut session = Session::new(SessionContext::default());
    session.handle(TagEvent::Input("env = pr".into()));
    session.handle(TagEvent::Cancel);

    assert!(session.group().is_empty());
    assert_eq!(session.input(), "");
    assert_eq!(session.state().stage(), Stage::Key);
}
