use smaddiction_engine::config::TrainingConfig;
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Writes a 120-row survey where usage and sleep separate the classes.
pub fn write_survey(dir: &Path) -> PathBuf {
    let platforms = ["Instagram", "TikTok", "YouTube", "Snapchat"];
    let mut csv = String::from(
        "Student_ID,Age,Gender,Academic_Level,Country,Avg_Daily_Usage_Hours,\
         Most_Used_Platform,Affects_Academic_Performance,Sleep_Hours_Per_Night,\
         Mental_Health_Score,Relationship_Status,Conflicts_Over_Social_Media,\
         Addicted_Score\n",
    );
    for i in 0..120usize {
        let usage = 1.0 + (i % 20) as f64 * 0.4;
        let heavy = usage >= 5.0;
        writeln!(
            csv,
            "{},{},{},{},Country{},{:.1},{},{},{:.1},{},{},{},{}",
            1000 + i,
            18 + i % 6,
            if i % 2 == 0 { "Male" } else { "Female" },
            if i % 3 == 0 { "Graduate" } else { "Undergraduate" },
            i % 5,
            usage,
            platforms[i % platforms.len()],
            if heavy { "Yes" } else { "No" },
            9.0 - usage * 0.5,
            if heavy { 4 } else { 8 },
            if i % 4 == 0 { "In Relationship" } else { "Single" },
            if heavy { 4 } else { 1 },
            if heavy { 8 } else { 4 }
        )
        .unwrap();
    }
    let path = dir.join("survey.csv");
    std::fs::write(&path, csv).unwrap();
    path
}

pub fn training_config(data_path: PathBuf) -> TrainingConfig {
    TrainingConfig {
        data_path,
        ..TrainingConfig::default()
    }
}
