use anyhow::Context;
use serde::Deserialize;
use serde::Serialize;
use std::fmt::Debug;
use std::fs::File;
use std::path::{Path, PathBuf};
use thetajoin::config::ThetaJoinConfig;

#[derive(Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub config: ThetaJoinConfig,
    pub expected_partition: String,
    pub expected_cost: f64,
    pub expected_max_area: usize,
    pub expected_max_half_perimeter: usize,
}

pub struct TestCaseRunner {
    /// Input file path.
    pub paths: Vec<PathBuf>,
}

impl TestCaseRunner {
    pub fn run(self) {
        for path in &self.paths {
            let file = File::options()
                .read(true)
                .open(path)
                .with_context(|| format!("Failed to open test case file: {:?}", &path))
                .unwrap();

            let test_cases: Vec<TestCase> = serde_yaml::from_reader(file)
                .with_context(|| format!("Failed to load test cases from file: {:?}", &path))
                .unwrap();

            for test_case in test_cases {
                self.run_case(path, test_case);
            }
        }
    }

    fn run_case<P: AsRef<Path> + Debug>(&self, path: &P, test_case: TestCase) {
        let partition = test_case
            .config
            .build_partition()
            .with_context(|| format!("Failed to build partition for {}", test_case.name))
            .unwrap();

        assert!(partition.valid(), "Case {} in {:?} is invalid.", test_case.name, path);
        assert_eq!(
            test_case.expected_partition,
            partition.to_string(),
            "Partition for {} in {:?} is different.",
            test_case.name,
            path
        );
        assert_eq!(
            test_case.expected_cost,
            partition.calculate_cost(),
            "Cost for {} in {:?} is different.",
            test_case.name,
            path
        );
        assert_eq!(
            test_case.expected_max_area,
            partition.max_area(),
            "Max area for {} in {:?} is different.",
            test_case.name,
            path
        );
        assert_eq!(
            test_case.expected_max_half_perimeter,
            partition.max_half_perimeter(),
            "Max half perimeter for {} in {:?} is different.",
            test_case.name,
            path
        );
    }
}
