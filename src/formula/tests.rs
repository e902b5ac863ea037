use super::*;
use crate::component::{ComponentType, FileAttributes, TreeRootHolder};
use crate::crawler::PathAwareCrawler;
use crate::measure::{Distribution, MapBasedMeasureRepository, MeasureVariations};
use crate::metric::core_metrics::*;
use chrono::Utc;
use std::sync::Arc;

const ROOT_REF: u32 = 1;
const MODULE_REF: u32 = 11;
const DIRECTORY_1_REF: u32 = 111;
const FILE_1_REF: u32 = 1111;
const FILE_2_REF: u32 = 1112;
const DIRECTORY_2_REF: u32 = 112;
const FILE_3_REF: u32 = 1121;
const MODULE_2_REF: u32 = 12;
const DIRECTORY_3_REF: u32 = 121;

fn file(reference: u32) -> Component {
    Component::builder(ComponentType::File, reference).build()
}

fn report_tree() -> TreeRootHolder {
    TreeRootHolder::new(
        Component::builder(ComponentType::Project, ROOT_REF)
            .with_child(
                Component::builder(ComponentType::Module, MODULE_REF)
                    .with_child(
                        Component::builder(ComponentType::Directory, DIRECTORY_1_REF)
                            .with_children([file(FILE_1_REF), file(FILE_2_REF)])
                            .build(),
                    )
                    .with_child(
                        Component::builder(ComponentType::Directory, DIRECTORY_2_REF)
                            .with_child(file(FILE_3_REF))
                            .build(),
                    )
                    .build(),
            )
            .with_child(
                Component::builder(ComponentType::Module, MODULE_2_REF)
                    .with_child(Component::builder(ComponentType::Directory, DIRECTORY_3_REF).build())
                    .build(),
            )
            .build(),
    )
    .unwrap()
}

struct Fixture {
    tree: TreeRootHolder,
    metrics: Arc<MetricRepository>,
    measures: MapBasedMeasureRepository,
}

impl Fixture {
    fn new(tree: TreeRootHolder) -> Self {
        let metrics = Arc::new(MetricRepository::core());
        let measures = MapBasedMeasureRepository::new(&tree, Arc::clone(&metrics));
        Self {
            tree,
            metrics,
            measures,
        }
    }

    fn raw(&mut self, reference: u32, key: &str, measure: Measure) -> &mut Self {
        self.measures.add_raw_measure(reference, key, measure).unwrap();
        self
    }

    fn run<'a>(&'a mut self, configure: impl FnOnce(FormulaExecutorBuilder<'a>) -> FormulaExecutorBuilder<'a>) {
        let builder = FormulaExecutorComponentVisitor::builder(&self.metrics, &mut self.measures);
        let mut visitor = configure(builder).build();
        PathAwareCrawler::new(&mut visitor)
            .visit(self.tree.root())
            .unwrap();
    }

    fn added(&self, reference: u32, key: &str) -> Option<&Measure> {
        self.measures.get_added_raw_measure(reference, key)
    }
}

#[test]
fn test_sum_aggregates_up_the_tree() {
    let mut fx = Fixture::new(report_tree());
    fx.raw(FILE_1_REF, NCLOC, Measure::int(10))
        .raw(FILE_2_REF, NCLOC, Measure::int(8))
        .raw(FILE_3_REF, NCLOC, Measure::int(2));
    fx.run(|b| b.formula(SumFormula::new(NCLOC)));

    assert_eq!(fx.added(DIRECTORY_1_REF, NCLOC), Some(&Measure::int(18)));
    assert_eq!(fx.added(DIRECTORY_2_REF, NCLOC), Some(&Measure::int(2)));
    assert_eq!(fx.added(MODULE_REF, NCLOC), Some(&Measure::int(20)));
    assert_eq!(fx.added(ROOT_REF, NCLOC), Some(&Measure::int(20)));
    // nothing on leaves, nothing where no leaf contributes
    assert!(fx.measures.get_added_raw_measures(FILE_1_REF).is_empty());
    assert!(fx.measures.get_added_raw_measures(MODULE_2_REF).is_empty());
    assert!(fx.measures.get_added_raw_measures(DIRECTORY_3_REF).is_empty());
}

#[test]
fn test_sum_without_leaf_data_adds_nothing() {
    let mut fx = Fixture::new(report_tree());
    fx.run(|b| b.formula(SumFormula::new(NCLOC)));
    assert!(fx.measures.added_measures().is_empty());
}

#[test]
fn test_sum_writes_long_metrics() {
    let mut fx = Fixture::new(report_tree());
    fx.raw(FILE_1_REF, LAST_COMMIT_DATE, Measure::long(5_000_000_000))
        .raw(FILE_2_REF, LAST_COMMIT_DATE, Measure::long(1));
    fx.run(|b| b.formula(SumFormula::new(LAST_COMMIT_DATE)));
    assert_eq!(
        fx.added(ROOT_REF, LAST_COMMIT_DATE),
        Some(&Measure::long(5_000_000_001))
    );
}

#[test]
fn test_sum_rejects_double_input() {
    let mut fx = Fixture::new(report_tree());
    fx.raw(FILE_1_REF, FILE_COMPLEXITY, Measure::double(1.5));
    let builder = FormulaExecutorComponentVisitor::builder(&fx.metrics, &mut fx.measures);
    let mut visitor = builder.formula(SumFormula::new(FILE_COMPLEXITY)).build();
    let err = PathAwareCrawler::new(&mut visitor)
        .visit(fx.tree.root())
        .unwrap_err();
    assert!(matches!(err, ComputeError::ValueConversion { target: "long", actual: "DOUBLE" }));
}

#[test]
fn test_skip_unit_tests() {
    let tree = TreeRootHolder::new(
        Component::builder(ComponentType::Directory, DIRECTORY_1_REF)
            .with_child(file(FILE_1_REF))
            .with_child(
                Component::builder(ComponentType::File, FILE_2_REF)
                    .with_file_attributes(FileAttributes::unit_test())
                    .build(),
            )
            .build(),
    )
    .unwrap();
    let mut fx = Fixture::new(tree);
    fx.raw(FILE_1_REF, LINES, Measure::int(10))
        .raw(FILE_2_REF, LINES, Measure::int(100));
    fx.run(|b| b.skip_unit_tests().formula(SumFormula::new(LINES)));
    assert_eq!(fx.added(DIRECTORY_1_REF, LINES), Some(&Measure::int(10)));
}

#[test]
fn test_distribution_merge() {
    let mut fx = Fixture::new(report_tree());
    let distribution = |s: &str| Measure::distribution(s.parse::<Distribution>().unwrap());
    fx.raw(FILE_1_REF, FUNCTION_COMPLEXITY_DISTRIBUTION, distribution("0.5=3;3.5=5;6.5=9"))
        .raw(FILE_2_REF, FUNCTION_COMPLEXITY_DISTRIBUTION, distribution("0.5=0;3.5=2;6.5=1"))
        .raw(FILE_3_REF, FUNCTION_COMPLEXITY_DISTRIBUTION, distribution("0.5=1;3.5=1;6.5=1"));
    fx.run(|b| b.formula(DistributionFormula::new(FUNCTION_COMPLEXITY_DISTRIBUTION)));

    assert_eq!(
        fx.added(DIRECTORY_1_REF, FUNCTION_COMPLEXITY_DISTRIBUTION),
        Some(&distribution("0.5=3;3.5=7;6.5=10"))
    );
    assert_eq!(
        fx.added(ROOT_REF, FUNCTION_COMPLEXITY_DISTRIBUTION),
        Some(&distribution("0.5=4;3.5=8;6.5=11"))
    );
    assert!(fx.added(FILE_1_REF, FUNCTION_COMPLEXITY_DISTRIBUTION).is_none());
}

#[test]
fn test_distribution_bucket_mismatch_drops_aggregate() {
    let mut fx = Fixture::new(report_tree());
    let distribution = |s: &str| Measure::distribution(s.parse::<Distribution>().unwrap());
    fx.raw(FILE_1_REF, FILE_COMPLEXITY_DISTRIBUTION, distribution("0=1;5=2"))
        .raw(FILE_2_REF, FILE_COMPLEXITY_DISTRIBUTION, distribution("0=1;10=2"))
        .raw(FILE_3_REF, FILE_COMPLEXITY_DISTRIBUTION, distribution("0=1;5=2"));
    fx.run(|b| b.formula(DistributionFormula::new(FILE_COMPLEXITY_DISTRIBUTION)));

    assert!(fx.added(DIRECTORY_1_REF, FILE_COMPLEXITY_DISTRIBUTION).is_none());
    assert_eq!(
        fx.added(DIRECTORY_2_REF, FILE_COMPLEXITY_DISTRIBUTION),
        Some(&distribution("0=1;5=2"))
    );
    assert!(fx.added(MODULE_REF, FILE_COMPLEXITY_DISTRIBUTION).is_none());
    assert!(fx.added(ROOT_REF, FILE_COMPLEXITY_DISTRIBUTION).is_none());
}

#[test]
fn test_average_is_recomputed_at_each_level() {
    let mut fx = Fixture::new(report_tree());
    fx.raw(FILE_1_REF, COMPLEXITY, Measure::int(5))
        .raw(FILE_1_REF, FUNCTIONS, Measure::int(2))
        .raw(FILE_2_REF, COMPLEXITY, Measure::int(1))
        .raw(FILE_2_REF, FUNCTIONS, Measure::int(1));
    fx.run(|b| b.formula(AverageFormula::new(FUNCTION_COMPLEXITY, COMPLEXITY, FUNCTIONS)));

    assert_eq!(fx.added(FILE_1_REF, FUNCTION_COMPLEXITY), Some(&Measure::double(2.5)));
    assert_eq!(fx.added(FILE_2_REF, FUNCTION_COMPLEXITY), Some(&Measure::double(1.0)));
    assert_eq!(fx.added(DIRECTORY_1_REF, FUNCTION_COMPLEXITY), Some(&Measure::double(2.0)));
    assert_eq!(fx.added(ROOT_REF, FUNCTION_COMPLEXITY), Some(&Measure::double(2.0)));
    assert!(fx.added(DIRECTORY_2_REF, FUNCTION_COMPLEXITY).is_none());
}

#[test]
fn test_average_fallback_on_leaves() {
    let mut fx = Fixture::new(report_tree());
    // specific metric on one leaf, only the generic one on the other
    fx.raw(FILE_1_REF, COMPLEXITY_IN_FUNCTIONS, Measure::int(4))
        .raw(FILE_1_REF, COMPLEXITY, Measure::int(40))
        .raw(FILE_1_REF, FUNCTIONS, Measure::int(2))
        .raw(FILE_2_REF, COMPLEXITY, Measure::int(6))
        .raw(FILE_2_REF, FUNCTIONS, Measure::int(3));
    fx.run(|b| {
        b.formula(
            AverageFormula::new(FUNCTION_COMPLEXITY, COMPLEXITY_IN_FUNCTIONS, FUNCTIONS)
                .with_fallback(COMPLEXITY),
        )
    });

    assert_eq!(fx.added(FILE_1_REF, FUNCTION_COMPLEXITY), Some(&Measure::double(2.0)));
    assert_eq!(fx.added(FILE_2_REF, FUNCTION_COMPLEXITY), Some(&Measure::double(2.0)));
    assert_eq!(fx.added(DIRECTORY_1_REF, FUNCTION_COMPLEXITY), Some(&Measure::double(2.0)));
}

#[test]
fn test_average_zero_denominator_yields_nothing() {
    let mut fx = Fixture::new(report_tree());
    fx.raw(FILE_1_REF, COMPLEXITY, Measure::int(5))
        .raw(FILE_1_REF, FILES, Measure::int(0));
    fx.run(|b| b.formula(AverageFormula::new(FILE_COMPLEXITY, COMPLEXITY, FILES)));
    assert!(fx.measures.added_measures().is_empty());
}

#[test]
fn test_coverage_ratios_and_rounding() {
    let mut fx = Fixture::new(report_tree());
    fx.raw(FILE_1_REF, LINES_TO_COVER, Measure::int(3000))
        .raw(FILE_1_REF, UNCOVERED_LINES, Measure::int(30))
        .raw(FILE_1_REF, CONDITIONS_TO_COVER, Measure::int(300))
        .raw(FILE_1_REF, UNCOVERED_CONDITIONS, Measure::int(9))
        .raw(FILE_2_REF, LINES_TO_COVER, Measure::int(2000))
        .raw(FILE_2_REF, UNCOVERED_LINES, Measure::int(200))
        .raw(FILE_2_REF, CONDITIONS_TO_COVER, Measure::int(400))
        .raw(FILE_2_REF, UNCOVERED_CONDITIONS, Measure::int(16));
    let [code, line, branch] = CoverageFormula::all_of(&UNIT_TEST_COVERAGE);
    fx.run(|b| b.formula(code).formula(line).formula(branch));

    assert_eq!(fx.added(FILE_1_REF, COVERAGE), Some(&Measure::double(98.8)));
    assert_eq!(fx.added(FILE_1_REF, LINE_COVERAGE), Some(&Measure::double(99.0)));
    assert_eq!(fx.added(FILE_1_REF, BRANCH_COVERAGE), Some(&Measure::double(97.0)));
    assert_eq!(fx.added(FILE_2_REF, COVERAGE), Some(&Measure::double(91.0)));
    assert_eq!(fx.added(FILE_2_REF, LINE_COVERAGE), Some(&Measure::double(90.0)));
    assert_eq!(fx.added(FILE_2_REF, BRANCH_COVERAGE), Some(&Measure::double(96.0)));
    assert_eq!(fx.added(DIRECTORY_1_REF, COVERAGE), Some(&Measure::double(95.5)));
    assert_eq!(fx.added(DIRECTORY_1_REF, LINE_COVERAGE), Some(&Measure::double(95.4)));
    assert_eq!(fx.added(DIRECTORY_1_REF, BRANCH_COVERAGE), Some(&Measure::double(96.4)));
    assert_eq!(fx.added(ROOT_REF, COVERAGE), Some(&Measure::double(95.5)));
    assert!(fx.added(FILE_3_REF, COVERAGE).is_none());
}

#[test]
fn test_code_and_line_coverage_need_lines() {
    let mut fx = Fixture::new(report_tree());
    fx.raw(FILE_1_REF, CONDITIONS_TO_COVER, Measure::int(10))
        .raw(FILE_1_REF, UNCOVERED_CONDITIONS, Measure::int(5))
        .raw(FILE_2_REF, LINES_TO_COVER, Measure::int(0));
    let [code, line, branch] = CoverageFormula::all_of(&UNIT_TEST_COVERAGE);
    fx.run(|b| b.formula(code).formula(line).formula(branch));

    assert_eq!(fx.added(FILE_1_REF, BRANCH_COVERAGE), Some(&Measure::double(50.0)));
    // conditions alone are not enough for code coverage
    assert!(fx.added(FILE_1_REF, LINE_COVERAGE).is_none());
    assert!(fx.added(FILE_1_REF, COVERAGE).is_none());
    // zero lines to cover: division by zero yields absence
    assert!(fx.added(FILE_2_REF, LINE_COVERAGE).is_none());
    assert!(fx.added(FILE_2_REF, COVERAGE).is_none());
}

#[test]
fn test_coverage_variation_per_period() {
    let now = Utc::now();
    let periods = vec![
        Period::new(2, "days", Some(now), now),
        Period::new(5, "version", Some(now), now),
    ];
    let variations = |p2: f64, p5: Option<f64>| {
        let mut v = MeasureVariations::new().with(2, p2).unwrap();
        if let Some(p5) = p5 {
            v.set(5, p5).unwrap();
        }
        Measure::variations_only(v)
    };
    let mut fx = Fixture::new(report_tree());
    fx.raw(FILE_1_REF, NEW_LINES_TO_COVER, variations(3000.0, Some(2000.0)))
        .raw(FILE_1_REF, NEW_UNCOVERED_LINES, variations(30.0, Some(200.0)))
        .raw(FILE_1_REF, NEW_CONDITIONS_TO_COVER, variations(300.0, Some(400.0)))
        .raw(FILE_1_REF, NEW_UNCOVERED_CONDITIONS, variations(9.0, Some(16.0)))
        .raw(FILE_2_REF, NEW_LINES_TO_COVER, variations(10.0, None))
        .raw(FILE_2_REF, NEW_UNCOVERED_LINES, variations(10.0, None));
    let [code, line, branch] = CoverageVariationFormula::all_of(&UNIT_TEST_COVERAGE);
    let periods_ref = &periods;
    fx.run(move |b| b.with_periods(periods_ref).formula(code).formula(line).formula(branch));

    let file_1 = fx.added(FILE_1_REF, NEW_COVERAGE).unwrap();
    assert!(!file_1.has_value());
    assert_eq!(file_1.variation(2), Some(98.8));
    assert_eq!(file_1.variation(5), Some(91.0));
    assert_eq!(fx.added(FILE_1_REF, NEW_LINE_COVERAGE).unwrap().variation(2), Some(99.0));
    assert_eq!(fx.added(FILE_1_REF, NEW_BRANCH_COVERAGE).unwrap().variation(5), Some(96.0));

    // file 2 only has period 2 and no conditions
    let file_2 = fx.added(FILE_2_REF, NEW_COVERAGE).unwrap();
    assert_eq!(file_2.variation(2), Some(0.0));
    assert_eq!(file_2.variation(5), None);
    assert!(fx.added(FILE_2_REF, NEW_BRANCH_COVERAGE).is_none());

    // (2970 + 291 + 0) / 3310 and (1800 + 384) / 2400
    let directory = fx.added(DIRECTORY_1_REF, NEW_COVERAGE).unwrap();
    assert_eq!(directory.variation(2), Some(98.5));
    assert_eq!(directory.variation(5), Some(91.0));
}

/// Writes twice the leaf's ncloc as generated ncloc, on leaves only
struct DoubleNcloc;

#[derive(Default)]
struct NclocCounter(Option<i64>);

impl Counter for NclocCounter {
    fn aggregate(&mut self, _other: &Self) {}

    fn initialize(&mut self, context: &CounterInitializationContext<'_>) -> Result<()> {
        self.0 = long_value(context.measure(NCLOC)?)?;
        Ok(())
    }
}

impl Formula for DoubleNcloc {
    type Counter = NclocCounter;

    fn create_new_counter(&self) -> NclocCounter {
        NclocCounter::default()
    }

    fn create_measure(&self, counter: &NclocCounter, context: &CreateMeasureContext<'_>) -> Result<Option<Measure>> {
        if !context.is_leaf() {
            return Ok(None);
        }
        counter
            .0
            .map(|v| numeric_measure(context.metric(), v * 2))
            .transpose()
    }

    fn output_metric_keys(&self) -> &[&'static str] {
        &[GENERATED_NCLOC]
    }
}

#[test]
fn test_later_formula_reads_earlier_output_on_same_leaf() {
    let mut fx = Fixture::new(report_tree());
    fx.raw(FILE_1_REF, NCLOC, Measure::int(10))
        .raw(FILE_3_REF, NCLOC, Measure::int(1));
    fx.run(|b| b.formula(DoubleNcloc).formula(SumFormula::new(GENERATED_NCLOC)));

    assert_eq!(fx.added(FILE_1_REF, GENERATED_NCLOC), Some(&Measure::int(20)));
    assert_eq!(fx.added(DIRECTORY_1_REF, GENERATED_NCLOC), Some(&Measure::int(20)));
    assert_eq!(fx.added(ROOT_REF, GENERATED_NCLOC), Some(&Measure::int(22)));
}

fn views_tree() -> TreeRootHolder {
    TreeRootHolder::new(
        Component::builder(ComponentType::View, ROOT_REF)
            .with_child(
                Component::builder(ComponentType::Subview, MODULE_REF)
                    .with_child(Component::builder(ComponentType::ProjectView, FILE_1_REF).build())
                    .with_child(Component::builder(ComponentType::ProjectView, FILE_2_REF).build())
                    .build(),
            )
            .with_child(Component::builder(ComponentType::ProjectView, FILE_3_REF).build())
            .build(),
    )
    .unwrap()
}

#[test]
fn test_project_views_feed_sums_but_receive_nothing() {
    let mut fx = Fixture::new(views_tree());
    fx.raw(FILE_1_REF, NCLOC, Measure::int(10))
        .raw(FILE_2_REF, NCLOC, Measure::int(8))
        .raw(FILE_3_REF, NCLOC, Measure::int(2))
        .raw(FILE_1_REF, COMPLEXITY, Measure::int(4))
        .raw(FILE_1_REF, FUNCTIONS, Measure::int(2));
    fx.run(|b| {
        b.formula(SumFormula::new(NCLOC))
            .formula(AverageFormula::new(FUNCTION_COMPLEXITY, COMPLEXITY, FUNCTIONS))
    });

    assert_eq!(fx.added(MODULE_REF, NCLOC), Some(&Measure::int(18)));
    assert_eq!(fx.added(ROOT_REF, NCLOC), Some(&Measure::int(20)));
    assert_eq!(fx.added(ROOT_REF, FUNCTION_COMPLEXITY), Some(&Measure::double(2.0)));
    for project_view in [FILE_1_REF, FILE_2_REF, FILE_3_REF] {
        assert!(fx.measures.get_added_raw_measures(project_view).is_empty());
    }
}
