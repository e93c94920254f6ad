use crate::{
    compose::{ComposedPath, ROOT_ALIAS, compose_path, foreign_key_displayname},
    config::Config,
    error::Error,
    source::{Hop, ResolvedSource, SourceDefinitions, SourceSpec, resolve},
    test_support::{catalog, dataset_table},
};
use ermpath_schema::{
    node::{ConstraintName, Table},
    types::ColumnType,
};
use proptest::prelude::*;

fn outbound(name: &str) -> Hop {
    Hop::outbound(ConstraintName::new("s", name))
}

fn resolve_all(specs: &[SourceSpec]) -> Vec<ResolvedSource> {
    let catalog = catalog();
    let root = dataset_table();
    let defs = SourceDefinitions::for_table(&root);

    specs
        .iter()
        .map(|spec| resolve(&catalog, &root, &defs, spec).expect("fixture source should resolve"))
        .collect()
}

fn compose_with(config: &Config, specs: &[SourceSpec]) -> ComposedPath {
    compose_path(&dataset_table(), &resolve_all(specs), config).expect("sources should compose")
}

fn compose(specs: &[SourceSpec]) -> ComposedPath {
    compose_with(&Config::default(), specs)
}

#[test]
fn sources_sharing_a_hop_share_one_join_alias() {
    let composed = compose(&[
        SourceSpec::path(vec![outbound("dataset_owner_fkey")], "name"),
        SourceSpec::path(vec![outbound("dataset_owner_fkey")], "affiliation"),
    ]);

    assert_eq!(composed.path, "F1:=left(owner)=(s:person:name)/$M");
    assert_eq!(composed.joins, 1);
    assert!(composed.projections.iter().all(|p| p.alias == "F1"));
    assert_eq!(composed.projections.len(), 2);
}

#[test]
fn branches_restart_from_their_parent_alias() {
    let composed = compose(&[
        SourceSpec::path(vec![outbound("dataset_owner_fkey")], "affiliation"),
        SourceSpec::path(
            vec![outbound("dataset_owner_fkey"), outbound("person_institute_fkey")],
            "name",
        ),
        SourceSpec::path(vec![outbound("dataset_category_fkey")], "name"),
    ]);

    assert_eq!(
        composed.path,
        "F1:=left(category)=(s:category:id)/$M/F2:=left(owner)=(s:person:name)\
         /F3:=left(institute)=(s:institute:id)/$M"
    );
    assert_eq!(composed.joins, 3);
}

#[test]
fn single_use_intermediate_hops_are_inlined() {
    let composed = compose(&[SourceSpec::named("owner_institute")]);

    assert_eq!(
        composed.path,
        "left(owner)=(s:person:name)/F1:=left(institute)=(s:institute:id)/$M"
    );
    assert_eq!(composed.alias_for("owner_institute"), Some("F1"));
    assert_eq!(composed.alias_for("owner_row"), None);
}

#[test]
fn sourcekey_used_twice_is_promoted_even_through_nesting() {
    let composed = compose(&[
        SourceSpec::named("owner_institute"),
        SourceSpec::named("owner_institute"),
    ]);

    // the nested prefix is counted with every use of its dependent key
    assert_eq!(
        composed.path,
        "F1:=left(owner)=(s:person:name)/F2:=left(institute)=(s:institute:id)/$M"
    );
    assert_eq!(composed.alias_for("owner_row"), Some("F1"));
    assert_eq!(composed.projections.len(), 1);
}

#[test]
fn forced_alias_replaces_the_generated_one() {
    let config = Config::default().with_forced_alias("owner_row", "OWN");
    let composed = compose_with(&config, &[SourceSpec::named("owner_institute")]);

    assert_eq!(
        composed.path,
        "OWN:=left(owner)=(s:person:name)/F1:=left(institute)=(s:institute:id)/$M"
    );
    assert_eq!(composed.alias_for("owner_row"), Some("OWN"));
}

#[test]
fn plain_columns_need_no_join() {
    let composed = compose(&[SourceSpec::column("title")]);

    assert!(composed.path.is_empty());
    assert_eq!(composed.joins, 0);
    assert_eq!(composed.projections[0].alias, ROOT_ALIAS);
    assert_eq!(composed.projections[0].to_string(), "title:=M:title");
}

#[test]
fn aggregate_projection_wraps_the_aliased_column() {
    let composed = compose(&[SourceSpec::named("file_count")]);
    let projection = &composed.projections[0];

    assert_eq!(composed.path, "F1:=left(id)=(s:file:dataset)/$M");
    assert_eq!(projection.to_string(), format!("{}:=cnt(F1:id)", projection.name));
}

#[test]
fn source_not_rooted_at_the_table_is_rejected() {
    let catalog = catalog();
    let person = catalog
        .table(Some("s"), "person")
        .expect("fixture table should exist")
        .clone();
    let defs = SourceDefinitions::default();
    let source = resolve(
        &catalog,
        &person,
        &defs,
        &SourceSpec::path(vec![outbound("person_institute_fkey")], "name"),
    )
    .expect("source should resolve against person");

    let err = compose_path(&dataset_table(), &[source], &Config::default())
        .expect_err("foreign root should fail");

    assert!(matches!(err, Error::InvalidSource { .. }));
}

#[test]
fn foreign_key_display_names_are_disambiguated() {
    let table = Table::new("s", "t")
        .with_column("x", ColumnType::Int4, true)
        .with_column("a", ColumnType::Int4, true)
        .with_column("b", ColumnType::Int4, true)
        .with_column("c", ColumnType::Int4, true)
        .with_column("d", ColumnType::Int4, true)
        .with_foreign_key("t_x_p_fkey", &[("x", "id")], ("s", "p"))
        .with_foreign_key("t_x_q_fkey", &[("x", "id")], ("s", "q"))
        .with_foreign_key("t_ab_fkey", &[("b", "k2"), ("a", "k1")], ("s", "r"))
        .with_foreign_key("t_dc_fkey", &[("d", "k1"), ("c", "k2")], ("s", "r"))
        .with_foreign_key("t_cd_z_fkey", &[("c", "k1"), ("d", "k2")], ("s", "z"));

    let names: Vec<String> = table
        .outbound_foreign_keys()
        .iter()
        .map(|fk| foreign_key_displayname(&table, fk))
        .collect();

    assert_eq!(names, ["p (x)", "q (x)", "r (a, b)", "r (c, d)", "z"]);

    let dataset = dataset_table();
    let names: Vec<String> = dataset
        .outbound_foreign_keys()
        .iter()
        .map(|fk| foreign_key_displayname(&dataset, fk))
        .collect();
    assert_eq!(names, ["category", "owner", "reviewer"]);
}

fn source_pool() -> Vec<SourceSpec> {
    vec![
        SourceSpec::column("title"),
        SourceSpec::named("owner_row"),
        SourceSpec::named("owner_affiliation"),
        SourceSpec::named("owner_institute"),
        SourceSpec::named("file_count"),
        SourceSpec::path(vec![outbound("dataset_category_fkey")], "name"),
        SourceSpec::path(vec![outbound("dataset_reviewer_fkey")], "affiliation"),
        SourceSpec::path(
            vec![outbound("dataset_reviewer_fkey"), outbound("person_institute_fkey")],
            "name",
        ),
    ]
}

fn arb_request() -> impl Strategy<Value = Vec<usize>> {
    let indices: Vec<usize> = (0..source_pool().len()).collect();

    prop::sample::subsequence(indices, 1..=8)
}

proptest! {
    #[test]
    fn composition_ignores_request_order(
        (request, shuffled) in arb_request().prop_flat_map(|r| (Just(r.clone()), Just(r).prop_shuffle()))
    ) {
        let pool = source_pool();
        let pick = |indices: &[usize]| indices.iter().map(|i| pool[*i].clone()).collect::<Vec<_>>();

        let first = compose(&pick(&request));
        let second = compose(&pick(&shuffled));

        prop_assert_eq!(first, second);
    }

    #[test]
    fn aliases_are_unique_within_a_path(request in arb_request()) {
        let pool = source_pool();
        let specs: Vec<SourceSpec> = request.iter().map(|i| pool[*i].clone()).collect();
        let composed = compose(&specs);

        let mut bound: Vec<&str> = composed
            .path
            .split('/')
            .filter_map(|segment| segment.split_once(":=").map(|(alias, _)| alias))
            .collect();
        let total = bound.len();
        bound.sort_unstable();
        bound.dedup();

        prop_assert_eq!(bound.len(), total);
        prop_assert!(!bound.contains(&ROOT_ALIAS));
    }
}
