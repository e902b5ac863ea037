use super::*;
use crate::component::{Component, ComponentType, TreeRootHolder};
use crate::config::EngineConfig;
use crate::measure::{Measure, MeasureRepository};
use crate::metric::core_metrics::{LINES, NCLOC};
use crate::metric::MetricRepository;
use std::sync::Arc;

/// Writes `value` for `key` on the root, or `input + 1` when it reads `input`
struct MockStep {
    name: &'static str,
    depends_on: &'static [&'static str],
    key: &'static str,
    input: Option<&'static str>,
    fail: bool,
}

impl MockStep {
    fn writing(name: &'static str, key: &'static str) -> Self {
        Self {
            name,
            depends_on: &[],
            key,
            input: None,
            fail: false,
        }
    }

    fn after(mut self, depends_on: &'static [&'static str]) -> Self {
        self.depends_on = depends_on;
        self
    }

    fn reading(mut self, input: &'static str) -> Self {
        self.input = Some(input);
        self
    }

    fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl ComputationStep for MockStep {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        "Mock step"
    }

    fn depends_on(&self) -> &'static [&'static str] {
        self.depends_on
    }

    fn execute(&self, context: &AnalysisContext, measures: &mut dyn MeasureRepository) -> Result<()> {
        if self.fail {
            return Err(ComputeError::Config(format!("{} failed", self.name)));
        }
        let root = context.tree().root();
        let value = match self.input {
            Some(input) => {
                let metric = context.metrics().get_by_key(input)?;
                let measure = measures
                    .get_raw_measure(root, metric)
                    .ok_or_else(|| ComputeError::Config(format!("{} missing", input)))?;
                measure.int_value()? + 1
            }
            None => 1,
        };
        let metric = context.metrics().get_by_key(self.key)?;
        measures.add(root, metric, Measure::int(value))
    }
}

fn boxed(steps: Vec<MockStep>) -> Vec<Box<dyn ComputationStep>> {
    steps
        .into_iter()
        .map(|s| Box::new(s) as Box<dyn ComputationStep>)
        .collect()
}

fn context() -> AnalysisContext {
    let root = Component::builder(ComponentType::Project, 1)
        .with_child(Component::builder(ComponentType::File, 2).build())
        .build();
    AnalysisContext::new(
        TreeRootHolder::new(root).unwrap(),
        Arc::new(MetricRepository::core()),
    )
}

#[test]
fn test_sequencer_workers() {
    let sequencer = StepSequencer::new(Vec::new());
    assert!(sequencer.workers() > 0);
    assert!(sequencer.workers() <= 16);
    assert!(!sequencer.is_parallel());

    let sequencer = StepSequencer::new(Vec::new()).with_workers(3);
    assert_eq!(sequencer.workers(), 3);
}

#[test]
fn test_execution_summary() {
    let mut summary = ExecutionSummary::default();
    summary.add_result(StepTiming {
        name: "size",
        duration_ms: 100,
        measures_added: 12,
    });
    summary.add_result(StepTiming {
        name: "coverage",
        duration_ms: 50,
        measures_added: 3,
    });

    assert_eq!(summary.steps_run(), 2);
    assert_eq!(summary.measures_added, 15);
    assert_eq!(summary.total_duration_ms, 150);
    assert_eq!(summary.step("coverage").map(|s| s.measures_added), Some(3));
    assert!(summary.step("comments").is_none());
}

#[test]
fn test_from_config() {
    let sequencer = StepSequencer::from_config(&EngineConfig::default()).unwrap();
    assert_eq!(
        sequencer.step_names(),
        vec!["size", "complexity", "comments", "coverage", "new-coverage", "last-commit"]
    );
    assert!(!sequencer.is_parallel());

    let config = EngineConfig::from_toml_str(
        "[engine]\nparallel = true\nworkers = 2\n[steps]\ndisabled = [\"last-commit\", \"comments\"]\n",
    )
    .unwrap();
    let sequencer = StepSequencer::from_config(&config).unwrap();
    assert_eq!(sequencer.step_names(), vec!["size", "complexity", "coverage", "new-coverage"]);
    assert!(sequencer.is_parallel());
    assert_eq!(sequencer.workers(), 2);
}

#[test]
fn test_from_config_rejects_unknown_step() {
    let config = EngineConfig::from_toml_str("[steps]\ndisabled = [\"duplications\"]\n").unwrap();
    let err = StepSequencer::from_config(&config).err().unwrap();
    assert!(matches!(err, ComputeError::UnknownStep(name) if name == "duplications"));
}

#[test]
fn test_default_waves() {
    let sequencer = StepSequencer::default();
    // complexity and comments wait for size
    assert_eq!(sequencer.waves().unwrap(), vec![vec![0, 3, 4, 5], vec![1, 2]]);
}

#[test]
fn test_unscheduled_dependency_is_ignored() {
    let config = EngineConfig::from_toml_str("[steps]\ndisabled = [\"size\"]\n").unwrap();
    let sequencer = StepSequencer::from_config(&config).unwrap();
    assert_eq!(sequencer.waves().unwrap(), vec![vec![0, 1, 2, 3, 4]]);
}

#[test]
fn test_dependency_chain_waves() {
    let sequencer = StepSequencer::new(boxed(vec![
        MockStep::writing("c", LINES).after(&["b"]),
        MockStep::writing("b", NCLOC).after(&["a"]),
        MockStep::writing("a", NCLOC),
    ]));
    assert_eq!(sequencer.waves().unwrap(), vec![vec![2], vec![1], vec![0]]);
}

#[test]
fn test_dependency_cycle() {
    let sequencer = StepSequencer::new(boxed(vec![
        MockStep::writing("free", LINES),
        MockStep::writing("a", NCLOC).after(&["b"]),
        MockStep::writing("b", NCLOC).after(&["a"]),
    ]));
    let err = sequencer.waves().unwrap_err();
    assert!(matches!(err, ComputeError::StepDependencyCycle(ref stuck) if stuck == &vec!["a", "b"]));

    let context = context();
    let mut measures = context.new_measure_repository();
    assert!(sequencer.parallel(true).run(&context, &mut measures).is_err());
}

#[test]
fn test_dependent_step_reads_measures_in_both_modes() {
    for parallel in [false, true] {
        let sequencer = StepSequencer::new(boxed(vec![
            MockStep::writing("a", NCLOC),
            MockStep::writing("b", LINES).after(&["a"]).reading(NCLOC),
        ]))
        .parallel(parallel)
        .with_workers(2);
        let context = context();
        let mut measures = context.new_measure_repository();
        let summary = sequencer.run(&context, &mut measures).unwrap();

        assert_eq!(measures.get_added_raw_measure(1, NCLOC), Some(&Measure::int(1)));
        assert_eq!(measures.get_added_raw_measure(1, LINES), Some(&Measure::int(2)));
        assert_eq!(summary.steps_run(), 2);
        assert_eq!(summary.measures_added, 2);
        assert_eq!(summary.step("b").map(|s| s.measures_added), Some(1));
    }
}

#[test]
fn test_write_once_holds_across_steps() {
    for parallel in [false, true] {
        let sequencer = StepSequencer::new(boxed(vec![
            MockStep::writing("a", NCLOC),
            MockStep::writing("b", NCLOC),
        ]))
        .parallel(parallel);
        let context = context();
        let mut measures = context.new_measure_repository();
        let err = sequencer.run(&context, &mut measures).unwrap_err();
        assert!(matches!(
            err,
            ComputeError::MeasureAlreadyExists { component_ref: 1, ref metric_key } if metric_key == NCLOC
        ));
    }
}

#[test]
fn test_failing_step_aborts_run() {
    for parallel in [false, true] {
        let sequencer = StepSequencer::new(boxed(vec![
            MockStep::writing("a", NCLOC).failing(),
            MockStep::writing("b", LINES).after(&["a"]),
        ]))
        .parallel(parallel);
        let context = context();
        let mut measures = context.new_measure_repository();
        let err = sequencer.run(&context, &mut measures).unwrap_err();
        assert_eq!(err.to_string(), "Invalid configuration: a failed");
        assert!(measures.get_added_raw_measure(1, LINES).is_none());
    }
}
