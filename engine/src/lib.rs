pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod handler;
pub mod model;
pub mod routes;
pub mod scaler;
pub mod split;
pub mod storage;
pub mod telemetry;
pub mod training;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::TrainingConfig;
    use crate::dataset::{self, Dataset, DatasetOptions};
    use crate::engine::Predictor;
    use crate::storage::ArtifactSet;
    use crate::training::fit_pipeline;
    use crate::types::{PredictionInput, Record};
    use std::fmt::Write;

    const GENDERS: [&str; 2] = ["Female", "Male"];
    const LEVELS: [&str; 3] = ["High School", "Undergraduate", "Graduate"];
    const COUNTRIES: [&str; 4] = ["India", "USA", "UK", "Canada"];
    const PLATFORMS: [&str; 5] = ["Instagram", "TikTok", "Facebook", "YouTube", "WhatsApp"];
    const RELATIONSHIPS: [&str; 3] = ["Single", "In Relationship", "Complicated"];

    pub fn fixture_csv() -> String {
        let mut csv = String::from(
            "Student_ID,Age,Gender,Academic_Level,Country,Avg_Daily_Usage_Hours,\
             Most_Used_Platform,Affects_Academic_Performance,Sleep_Hours_Per_Night,\
             Mental_Health_Score,Relationship_Status,Conflicts_Over_Social_Media,\
             Addicted_Score\n",
        );
        for i in 0..80usize {
            let usage = 1.5 + (i % 16) as f64 * 0.5;
            let heavy = usage >= 5.0;
            let score = if heavy { 8 + i % 2 } else { 3 + i % 3 };
            let sleep = 8.5 - (i % 16) as f64 * 0.25 + (i % 3) as f64 * 0.3;
            let mental = if heavy { 5 - i % 2 } else { 7 + i % 3 };
            let conflicts = if heavy { 3 + i % 2 } else { i % 2 };
            writeln!(
                csv,
                "{},{},{},{},{},{:.1},{},{},{:.1},{},{},{},{}",
                i + 1,
                18 + i % 7,
                GENDERS[i % GENDERS.len()],
                LEVELS[i % LEVELS.len()],
                COUNTRIES[i % COUNTRIES.len()],
                usage,
                PLATFORMS[i % PLATFORMS.len()],
                if heavy { "Yes" } else { "No" },
                sleep,
                mental,
                RELATIONSHIPS[i % RELATIONSHIPS.len()],
                conflicts,
                score
            )
            .unwrap();
        }
        csv
    }

    pub fn fixture_training_config() -> TrainingConfig {
        TrainingConfig::default()
    }

    pub fn fixture_dataset() -> Dataset {
        let options = DatasetOptions::from(&fixture_training_config());
        dataset::from_reader(fixture_csv().as_bytes(), &options).unwrap()
    }

    pub fn fixture_artifacts() -> ArtifactSet {
        fit_pipeline(&fixture_dataset(), &fixture_training_config())
            .unwrap()
            .artifacts
    }

    pub fn fixture_predictor() -> Predictor {
        Predictor::new(fixture_artifacts()).unwrap()
    }

    pub fn reference_record() -> Record {
        Record::from(PredictionInput {
            age: 21,
            gender: "Female".into(),
            academic_level: "University".into(),
            avg_daily_usage_hours: 5.5,
            most_used_platform: "Instagram".into(),
            sleep_hours_per_night: 6.0,
            mental_health_score: 65,
            conflicts_over_social_media: 3,
            affects_academic_performance: "Yes".into(),
            relationship_status: "Single".into(),
        })
    }
}
