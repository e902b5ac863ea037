use super::*;
use crate::component::ComponentType;
use crate::measure::Measure;
use crate::metric::core_metrics::NCLOC;
use chrono::TimeZone;
use crate::config::EngineConfig;

fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

fn periods() -> PeriodsHolder {
    let analysis = date(2015, 1, 1);
    PeriodsHolder::new(
        [5, 1, 3, 4]
            .into_iter()
            .map(|index| Period::new(index, "days", Some(date(2014, 1, index as u32)), analysis))
            .collect(),
    )
    .unwrap()
}

fn context(root_type: ComponentType, leaf_type: ComponentType) -> AnalysisContext {
    let root = Component::builder(root_type, 1)
        .with_child(Component::builder(leaf_type, 2).build())
        .build();
    AnalysisContext::new(
        TreeRootHolder::new(root).unwrap(),
        Arc::new(MetricRepository::core()),
    )
}

fn indexes(periods: &[Period]) -> Vec<usize> {
    periods.iter().map(|p| p.index).collect()
}

#[test]
fn test_report_tree_keeps_every_period() {
    let context = context(ComponentType::Project, ComponentType::File).with_periods(periods());
    assert_eq!(indexes(&context.periods_for_tree()), vec![1, 3, 4, 5]);
}

#[test]
fn test_views_tree_limits_periods() {
    let context = context(ComponentType::View, ComponentType::ProjectView).with_periods(periods());
    assert_eq!(indexes(&context.periods_for_tree()), vec![1, 3]);

    let context = context.with_views_max_period_index(4);
    assert_eq!(indexes(&context.periods_for_tree()), vec![1, 3, 4]);
}

#[test]
fn test_views_period_limit_is_capped() {
    let context = context(ComponentType::View, ComponentType::ProjectView)
        .with_periods(periods())
        .with_views_max_period_index(9);
    assert_eq!(indexes(&context.periods_for_tree()), vec![1, 3, 4, 5]);
}

#[test]
fn test_views_period_limit_from_config() {
    let config = EngineConfig::from_toml_str("[views]\nmax_period_index = 4\n").unwrap();
    let context = context(ComponentType::View, ComponentType::ProjectView)
        .with_periods(periods())
        .with_config(&config);
    assert_eq!(indexes(&context.periods_for_tree()), vec![1, 3, 4]);

    let context = context.with_config(&EngineConfig::default());
    assert_eq!(indexes(&context.periods_for_tree()), vec![1, 3]);
}

#[test]
fn test_context_defaults() {
    let context = context(ComponentType::Project, ComponentType::File);
    assert!(!context.periods().has_periods());
    assert!(context.periods_for_tree().is_empty());
    assert!(context.changesets().get_changesets(2).is_none());

    let analysis_date = date(2016, 3, 1);
    let context = context.with_analysis_date(analysis_date);
    assert_eq!(context.analysis_date(), analysis_date);
}

#[test]
fn test_new_measure_repository_is_bound_to_the_tree() {
    let context = context(ComponentType::Project, ComponentType::File);
    let mut measures = context.new_measure_repository();
    assert!(measures.is_empty());
    measures.add_raw_measure(2, NCLOC, Measure::int(10)).unwrap();
    assert!(measures.add_raw_measure(3, NCLOC, Measure::int(10)).is_err());
}

#[test]
fn test_default_steps_order() {
    let names: Vec<_> = default_steps().iter().map(|s| s.name()).collect();
    assert_eq!(
        names,
        vec!["size", "complexity", "comments", "coverage", "new-coverage", "last-commit"]
    );
    // dependencies always come first
    for (i, step) in default_steps().iter().enumerate() {
        for dependency in step.depends_on() {
            assert!(names[..i].contains(dependency), "{} before {}", dependency, step.name());
        }
    }
}

#[test]
fn test_add_numeric_uses_metric_type() {
    let context = context(ComponentType::Project, ComponentType::File);
    let mut measures = context.new_measure_repository();
    let file = context.tree().get_by_ref(2).unwrap();
    add_numeric(&mut measures, context.metrics(), file, NCLOC, 42).unwrap();
    assert_eq!(measures.get_added_raw_measure(2, NCLOC), Some(&Measure::int(42)));

    let root = context.tree().root();
    assert!(add_numeric(&mut measures, context.metrics(), root, NCLOC, i64::MAX).is_err());
}
