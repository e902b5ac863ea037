//! Keys and definitions of the metrics handled by the built-in steps

use super::{Metric, MetricType};

// Size
pub const LINES: &str = "lines";
pub const GENERATED_LINES: &str = "generated_lines";
pub const NCLOC: &str = "ncloc";
pub const GENERATED_NCLOC: &str = "generated_ncloc";
pub const FUNCTIONS: &str = "functions";
pub const STATEMENTS: &str = "statements";
pub const CLASSES: &str = "classes";
pub const ACCESSORS: &str = "accessors";
pub const FILES: &str = "files";
pub const DIRECTORIES: &str = "directories";

// Complexity
pub const COMPLEXITY: &str = "complexity";
pub const COMPLEXITY_IN_CLASSES: &str = "complexity_in_classes";
pub const COMPLEXITY_IN_FUNCTIONS: &str = "complexity_in_functions";
pub const FILE_COMPLEXITY: &str = "file_complexity";
pub const CLASS_COMPLEXITY: &str = "class_complexity";
pub const FUNCTION_COMPLEXITY: &str = "function_complexity";
pub const FILE_COMPLEXITY_DISTRIBUTION: &str = "file_complexity_distribution";
pub const CLASS_COMPLEXITY_DISTRIBUTION: &str = "class_complexity_distribution";
pub const FUNCTION_COMPLEXITY_DISTRIBUTION: &str = "function_complexity_distribution";

// Comments and documentation
pub const COMMENT_LINES: &str = "comment_lines";
pub const COMMENT_LINES_DENSITY: &str = "comment_lines_density";
pub const COMMENTED_OUT_CODE_LINES: &str = "commented_out_code_lines";
pub const PUBLIC_API: &str = "public_api";
pub const PUBLIC_UNDOCUMENTED_API: &str = "public_undocumented_api";
pub const PUBLIC_DOCUMENTED_API_DENSITY: &str = "public_documented_api_density";

// SCM
pub const LAST_COMMIT_DATE: &str = "last_commit_date";
pub const DAYS_SINCE_LAST_COMMIT: &str = "days_since_last_commit";

// Quality gate
pub const ALERT_STATUS: &str = "alert_status";

// Unit test coverage
pub const LINES_TO_COVER: &str = "lines_to_cover";
pub const UNCOVERED_LINES: &str = "uncovered_lines";
pub const CONDITIONS_TO_COVER: &str = "conditions_to_cover";
pub const UNCOVERED_CONDITIONS: &str = "uncovered_conditions";
pub const COVERAGE: &str = "coverage";
pub const LINE_COVERAGE: &str = "line_coverage";
pub const BRANCH_COVERAGE: &str = "branch_coverage";
pub const COVERAGE_LINE_HITS_DATA: &str = "coverage_line_hits_data";
pub const CONDITIONS_BY_LINE: &str = "conditions_by_line";
pub const COVERED_CONDITIONS_BY_LINE: &str = "covered_conditions_by_line";
pub const NEW_LINES_TO_COVER: &str = "new_lines_to_cover";
pub const NEW_UNCOVERED_LINES: &str = "new_uncovered_lines";
pub const NEW_CONDITIONS_TO_COVER: &str = "new_conditions_to_cover";
pub const NEW_UNCOVERED_CONDITIONS: &str = "new_uncovered_conditions";
pub const NEW_COVERAGE: &str = "new_coverage";
pub const NEW_LINE_COVERAGE: &str = "new_line_coverage";
pub const NEW_BRANCH_COVERAGE: &str = "new_branch_coverage";

// Integration test coverage
pub const IT_LINES_TO_COVER: &str = "it_lines_to_cover";
pub const IT_UNCOVERED_LINES: &str = "it_uncovered_lines";
pub const IT_CONDITIONS_TO_COVER: &str = "it_conditions_to_cover";
pub const IT_UNCOVERED_CONDITIONS: &str = "it_uncovered_conditions";
pub const IT_COVERAGE: &str = "it_coverage";
pub const IT_LINE_COVERAGE: &str = "it_line_coverage";
pub const IT_BRANCH_COVERAGE: &str = "it_branch_coverage";
pub const IT_COVERAGE_LINE_HITS_DATA: &str = "it_coverage_line_hits_data";
pub const IT_CONDITIONS_BY_LINE: &str = "it_conditions_by_line";
pub const IT_COVERED_CONDITIONS_BY_LINE: &str = "it_covered_conditions_by_line";
pub const NEW_IT_LINES_TO_COVER: &str = "new_it_lines_to_cover";
pub const NEW_IT_UNCOVERED_LINES: &str = "new_it_uncovered_lines";
pub const NEW_IT_CONDITIONS_TO_COVER: &str = "new_it_conditions_to_cover";
pub const NEW_IT_UNCOVERED_CONDITIONS: &str = "new_it_uncovered_conditions";
pub const NEW_IT_COVERAGE: &str = "new_it_coverage";
pub const NEW_IT_LINE_COVERAGE: &str = "new_it_line_coverage";
pub const NEW_IT_BRANCH_COVERAGE: &str = "new_it_branch_coverage";

// Overall coverage
pub const OVERALL_LINES_TO_COVER: &str = "overall_lines_to_cover";
pub const OVERALL_UNCOVERED_LINES: &str = "overall_uncovered_lines";
pub const OVERALL_CONDITIONS_TO_COVER: &str = "overall_conditions_to_cover";
pub const OVERALL_UNCOVERED_CONDITIONS: &str = "overall_uncovered_conditions";
pub const OVERALL_COVERAGE: &str = "overall_coverage";
pub const OVERALL_LINE_COVERAGE: &str = "overall_line_coverage";
pub const OVERALL_BRANCH_COVERAGE: &str = "overall_branch_coverage";
pub const OVERALL_COVERAGE_LINE_HITS_DATA: &str = "overall_coverage_line_hits_data";
pub const OVERALL_CONDITIONS_BY_LINE: &str = "overall_conditions_by_line";
pub const OVERALL_COVERED_CONDITIONS_BY_LINE: &str = "overall_covered_conditions_by_line";
pub const NEW_OVERALL_LINES_TO_COVER: &str = "new_overall_lines_to_cover";
pub const NEW_OVERALL_UNCOVERED_LINES: &str = "new_overall_uncovered_lines";
pub const NEW_OVERALL_CONDITIONS_TO_COVER: &str = "new_overall_conditions_to_cover";
pub const NEW_OVERALL_UNCOVERED_CONDITIONS: &str = "new_overall_uncovered_conditions";
pub const NEW_OVERALL_COVERAGE: &str = "new_overall_coverage";
pub const NEW_OVERALL_LINE_COVERAGE: &str = "new_overall_line_coverage";
pub const NEW_OVERALL_BRANCH_COVERAGE: &str = "new_overall_branch_coverage";

/// Metric keys of one coverage family (unit tests, integration tests, overall)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageKeys {
    pub name: &'static str,
    pub lines_to_cover: &'static str,
    pub uncovered_lines: &'static str,
    pub conditions_to_cover: &'static str,
    pub uncovered_conditions: &'static str,
    pub coverage: &'static str,
    pub line_coverage: &'static str,
    pub branch_coverage: &'static str,
    pub line_hits_data: &'static str,
    pub conditions_by_line: &'static str,
    pub covered_conditions_by_line: &'static str,
    pub new_lines_to_cover: &'static str,
    pub new_uncovered_lines: &'static str,
    pub new_conditions_to_cover: &'static str,
    pub new_uncovered_conditions: &'static str,
    pub new_coverage: &'static str,
    pub new_line_coverage: &'static str,
    pub new_branch_coverage: &'static str,
}

pub const UNIT_TEST_COVERAGE: CoverageKeys = CoverageKeys {
    name: "unit tests",
    lines_to_cover: LINES_TO_COVER,
    uncovered_lines: UNCOVERED_LINES,
    conditions_to_cover: CONDITIONS_TO_COVER,
    uncovered_conditions: UNCOVERED_CONDITIONS,
    coverage: COVERAGE,
    line_coverage: LINE_COVERAGE,
    branch_coverage: BRANCH_COVERAGE,
    line_hits_data: COVERAGE_LINE_HITS_DATA,
    conditions_by_line: CONDITIONS_BY_LINE,
    covered_conditions_by_line: COVERED_CONDITIONS_BY_LINE,
    new_lines_to_cover: NEW_LINES_TO_COVER,
    new_uncovered_lines: NEW_UNCOVERED_LINES,
    new_conditions_to_cover: NEW_CONDITIONS_TO_COVER,
    new_uncovered_conditions: NEW_UNCOVERED_CONDITIONS,
    new_coverage: NEW_COVERAGE,
    new_line_coverage: NEW_LINE_COVERAGE,
    new_branch_coverage: NEW_BRANCH_COVERAGE,
};

pub const INTEGRATION_TEST_COVERAGE: CoverageKeys = CoverageKeys {
    name: "integration tests",
    lines_to_cover: IT_LINES_TO_COVER,
    uncovered_lines: IT_UNCOVERED_LINES,
    conditions_to_cover: IT_CONDITIONS_TO_COVER,
    uncovered_conditions: IT_UNCOVERED_CONDITIONS,
    coverage: IT_COVERAGE,
    line_coverage: IT_LINE_COVERAGE,
    branch_coverage: IT_BRANCH_COVERAGE,
    line_hits_data: IT_COVERAGE_LINE_HITS_DATA,
    conditions_by_line: IT_CONDITIONS_BY_LINE,
    covered_conditions_by_line: IT_COVERED_CONDITIONS_BY_LINE,
    new_lines_to_cover: NEW_IT_LINES_TO_COVER,
    new_uncovered_lines: NEW_IT_UNCOVERED_LINES,
    new_conditions_to_cover: NEW_IT_CONDITIONS_TO_COVER,
    new_uncovered_conditions: NEW_IT_UNCOVERED_CONDITIONS,
    new_coverage: NEW_IT_COVERAGE,
    new_line_coverage: NEW_IT_LINE_COVERAGE,
    new_branch_coverage: NEW_IT_BRANCH_COVERAGE,
};

pub const OVERALL_COVERAGE_KEYS: CoverageKeys = CoverageKeys {
    name: "overall",
    lines_to_cover: OVERALL_LINES_TO_COVER,
    uncovered_lines: OVERALL_UNCOVERED_LINES,
    conditions_to_cover: OVERALL_CONDITIONS_TO_COVER,
    uncovered_conditions: OVERALL_UNCOVERED_CONDITIONS,
    coverage: OVERALL_COVERAGE,
    line_coverage: OVERALL_LINE_COVERAGE,
    branch_coverage: OVERALL_BRANCH_COVERAGE,
    line_hits_data: OVERALL_COVERAGE_LINE_HITS_DATA,
    conditions_by_line: OVERALL_CONDITIONS_BY_LINE,
    covered_conditions_by_line: OVERALL_COVERED_CONDITIONS_BY_LINE,
    new_lines_to_cover: NEW_OVERALL_LINES_TO_COVER,
    new_uncovered_lines: NEW_OVERALL_UNCOVERED_LINES,
    new_conditions_to_cover: NEW_OVERALL_CONDITIONS_TO_COVER,
    new_uncovered_conditions: NEW_OVERALL_UNCOVERED_CONDITIONS,
    new_coverage: NEW_OVERALL_COVERAGE,
    new_line_coverage: NEW_OVERALL_LINE_COVERAGE,
    new_branch_coverage: NEW_OVERALL_BRANCH_COVERAGE,
};

/// The three coverage families, in computation order
pub const COVERAGE_FAMILIES: [CoverageKeys; 3] = [
    UNIT_TEST_COVERAGE,
    INTEGRATION_TEST_COVERAGE,
    OVERALL_COVERAGE_KEYS,
];

fn percent(id: u32, key: &str, name: &str) -> Metric {
    Metric::new(id, key, name, MetricType::Percent).with_decimal_scale(1)
}

/// Every core metric with a stable id
pub fn all() -> Vec<Metric> {
    use MetricType::*;

    let mut metrics = vec![
        Metric::new(1, LINES, "Lines", Int),
        Metric::new(2, GENERATED_LINES, "Generated lines", Int),
        Metric::new(3, NCLOC, "Lines of code", Int),
        Metric::new(4, GENERATED_NCLOC, "Generated lines of code", Int),
        Metric::new(5, FUNCTIONS, "Functions", Int),
        Metric::new(6, STATEMENTS, "Statements", Int),
        Metric::new(7, CLASSES, "Classes", Int),
        Metric::new(8, ACCESSORS, "Accessors", Int),
        Metric::new(9, FILES, "Files", Int),
        Metric::new(10, DIRECTORIES, "Directories", Int),
        Metric::new(20, COMPLEXITY, "Complexity", Int),
        Metric::new(21, COMPLEXITY_IN_CLASSES, "Complexity in classes", Int),
        Metric::new(22, COMPLEXITY_IN_FUNCTIONS, "Complexity in functions", Int),
        Metric::new(23, FILE_COMPLEXITY, "Complexity / file", Float).with_decimal_scale(1),
        Metric::new(24, CLASS_COMPLEXITY, "Complexity / class", Float).with_decimal_scale(1),
        Metric::new(25, FUNCTION_COMPLEXITY, "Complexity / function", Float).with_decimal_scale(1),
        Metric::new(26, FILE_COMPLEXITY_DISTRIBUTION, "File distribution / complexity", Distribution),
        Metric::new(27, CLASS_COMPLEXITY_DISTRIBUTION, "Class distribution / complexity", Distribution),
        Metric::new(28, FUNCTION_COMPLEXITY_DISTRIBUTION, "Function distribution / complexity", Distribution),
        Metric::new(40, COMMENT_LINES, "Comment lines", Int),
        percent(41, COMMENT_LINES_DENSITY, "Comments (%)"),
        Metric::new(42, COMMENTED_OUT_CODE_LINES, "Commented-out lines of code", Int),
        Metric::new(43, PUBLIC_API, "Public API", Int),
        Metric::new(44, PUBLIC_UNDOCUMENTED_API, "Public undocumented API", Int),
        percent(45, PUBLIC_DOCUMENTED_API_DENSITY, "Public documented API (%)"),
        Metric::new(50, LAST_COMMIT_DATE, "Date of last commit", Long),
        Metric::new(51, DAYS_SINCE_LAST_COMMIT, "Days since last commit", Int),
        Metric::new(60, ALERT_STATUS, "Quality gate status", Level),
    ];

    for (family, keys) in COVERAGE_FAMILIES.iter().enumerate() {
        let base = 100 + 20 * family as u32;
        metrics.extend([
            Metric::new(base, keys.lines_to_cover, "Lines to cover", Int),
            Metric::new(base + 1, keys.uncovered_lines, "Uncovered lines", Int),
            Metric::new(base + 2, keys.conditions_to_cover, "Conditions to cover", Int),
            Metric::new(base + 3, keys.uncovered_conditions, "Uncovered conditions", Int),
            percent(base + 4, keys.coverage, "Coverage"),
            percent(base + 5, keys.line_coverage, "Line coverage"),
            percent(base + 6, keys.branch_coverage, "Condition coverage"),
            Metric::new(base + 7, keys.line_hits_data, "Coverage hits by line", String),
            Metric::new(base + 8, keys.conditions_by_line, "Conditions by line", String),
            Metric::new(base + 9, keys.covered_conditions_by_line, "Covered conditions by line", String),
            Metric::new(base + 10, keys.new_lines_to_cover, "Lines to cover on new code", Int),
            Metric::new(base + 11, keys.new_uncovered_lines, "Uncovered lines on new code", Int),
            Metric::new(base + 12, keys.new_conditions_to_cover, "Conditions to cover on new code", Int),
            Metric::new(base + 13, keys.new_uncovered_conditions, "Uncovered conditions on new code", Int),
            percent(base + 14, keys.new_coverage, "Coverage on new code"),
            percent(base + 15, keys.new_line_coverage, "Line coverage on new code"),
            percent(base + 16, keys.new_branch_coverage, "Condition coverage on new code"),
        ]);
    }
    metrics
}
