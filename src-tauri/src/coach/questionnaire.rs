//! Onboarding question catalogue
//!
//! Answer ids match the keys read by `Profile::from_answers`.

use serde::{Deserialize, Serialize};

use crate::units::format_height;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
  SingleChoice,
  MultiChoice,
  Number,
  Text,
  Select,
  Date,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
  pub value: String,
  pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
  pub id: String,
  #[serde(rename = "type")]
  pub kind: QuestionType,
  pub label: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub required: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub placeholder: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub options: Option<Vec<QuestionOption>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub help: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub min: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Questionnaire {
  pub coach: String,
  pub questions: Vec<Question>,
}

impl Question {
  fn new(id: &str, kind: QuestionType, label: &str) -> Self {
    Self {
      id: id.to_string(),
      kind,
      label: label.to_string(),
      required: None,
      placeholder: None,
      options: None,
      help: None,
      min: None,
      max: None,
    }
  }

  fn required(mut self) -> Self {
    self.required = Some(true);
    self
  }

  fn placeholder(mut self, text: &str) -> Self {
    self.placeholder = Some(text.to_string());
    self
  }

  fn help(mut self, text: &str) -> Self {
    self.help = Some(text.to_string());
    self
  }

  fn range(mut self, min: f64, max: f64) -> Self {
    self.min = Some(min);
    self.max = Some(max);
    self
  }

  fn options(mut self, pairs: &[(&str, &str)]) -> Self {
    self.options = Some(
      pairs
        .iter()
        .map(|(value, label)| QuestionOption {
          value: value.to_string(),
          label: label.to_string(),
        })
        .collect(),
    );
    self
  }
}

/// 150 to 200 cm in 5 cm steps, labelled with feet and inches
pub fn height_options() -> Vec<QuestionOption> {
  (150..=200)
    .step_by(5)
    .map(|cm| {
      let label = format_height(cm);
      QuestionOption {
        value: label.clone(),
        label,
      }
    })
    .collect()
}

pub fn questionnaire(coach: &str) -> Questionnaire {
  use QuestionType::*;

  let mut height = Question::new("height", Select, "What is your height?").required();
  height.options = Some(height_options());

  let questions = vec![
    Question::new("name", Text, "Your name (optional)").placeholder("Ricardo"),
    Question::new("sex", Select, "Sex").required().options(&[
      ("male", "Male"),
      ("female", "Female"),
      ("other", "Other / prefer not to say"),
    ]),
    Question::new("age", Number, "Age").required().range(12.0, 100.0),
    Question::new("units", Select, "Units").required().options(&[
      ("metric", "Metric (cm, kg, km)"),
      ("imperial", "Imperial (in, lb, mi)"),
    ]),
    height,
    Question::new("weight", Number, "Weight")
      .required()
      .help("Enter kilograms if metric, or pounds if imperial."),
    Question::new("primary_goals", MultiChoice, "Primary goals").required().options(&[
      ("fat_loss", "Fat loss"),
      ("general_fitness", "General fitness"),
      ("muscle_gain", "Build muscle"),
      ("hybrid", "Hybrid (mix cardio + strength)"),
      ("endurance", "Endurance focus"),
      ("performance_sport", "Sport performance"),
      ("mobility", "Mobility / injury prevention"),
    ]),
    Question::new("modalities", MultiChoice, "What types of training do you want?")
      .required()
      .options(&[
        ("strength", "Strength / Lifting"),
        ("run", "Running"),
        ("bike", "Cycling"),
        ("swim", "Swimming"),
        ("hiit", "HIIT / conditioning"),
        ("mobility", "Mobility / flexibility"),
        ("walk", "Walking / low impact"),
      ]),
    Question::new("experience", Select, "Training experience").required().options(&[
      ("beginner", "Beginner"),
      ("intermediate", "Intermediate"),
      ("advanced", "Advanced"),
    ]),
    Question::new("availability", Number, "How many days/week can you train?")
      .required()
      .range(1.0, 7.0),
    Question::new("exercise_frequency", Select, "Exercise Frequency").options(&[
      ("1-2", "1-2 times per week"),
      ("3-4", "3-4 times per week"),
      ("5-6", "5-6 times per week"),
      ("every_day", "Every day"),
    ]),
    Question::new("current_goal", Select, "Current Goal").options(&[
      ("build_muscle", "Build Muscle"),
      ("lose_fat", "Lose Fat"),
      ("improve_endurance", "Improve Endurance"),
      ("maintain_fitness", "Maintain Fitness"),
      ("other", "Other"),
    ]),
    Question::new("split_pref", Select, "Preferred strength split (optional)").options(&[
      ("full_body", "Full body"),
      ("upper_lower", "Upper / Lower"),
      ("push_pull_legs", "Push / Pull / Legs"),
      ("no_pref", "No preference"),
    ]),
    Question::new("cardio_intensity", Select, "Preferred cardio intensity (optional)").options(&[
      ("low", "Low (easy / steady)"),
      ("mixed", "Mixed (steady + intervals)"),
      ("high", "High (tempo / VO2)"),
      ("no_pref", "No preference"),
    ]),
    Question::new("preferred_rest_days", MultiChoice, "Preferred rest days (optional)").options(&[
      ("Mon", "Mon"),
      ("Tue", "Tue"),
      ("Wed", "Wed"),
      ("Thu", "Thu"),
      ("Fri", "Fri"),
      ("Sat", "Sat"),
      ("Sun", "Sun"),
    ]),
    Question::new("equipment", MultiChoice, "Available equipment").options(&[
      ("gym", "Gym access"),
      ("dumbbells", "Dumbbells"),
      ("barbell", "Barbell"),
      ("machines", "Machines"),
      ("bands", "Resistance bands"),
      ("treadmill", "Treadmill"),
      ("bike_trainer", "Indoor bike"),
      ("pool", "Pool"),
      ("none", "Bodyweight only"),
    ]),
    Question::new("constraints", MultiChoice, "Injuries / constraints").options(&[
      ("no_deadlifts", "No deadlifts"),
      ("knee_pain", "Knee pain"),
      ("back_pain", "Back pain"),
      ("shoulder_pain", "Shoulder pain"),
      ("low_impact_only", "Low impact only"),
      ("none", "None"),
    ]),
    Question::new("recent_strength", Text, "Recent strength PRs (optional)")
      .placeholder("e.g., Bench 225x5, Squat 275x3"),
    Question::new("recent_cardio", Text, "Recent cardio baseline (optional)")
      .placeholder("e.g., 3 mi easy ~10:00/mi; FTP 220W"),
    Question::new("diet_type", Select, "Diet Type").options(&[
      ("regular", "Regular"),
      ("vegetarian", "Vegetarian"),
      ("vegan", "Vegan"),
      ("pescatarian", "Pescatarian"),
      ("keto", "Keto"),
      ("paleo", "Paleo"),
      ("mediterranean", "Mediterranean"),
      ("intermittent_fasting", "Intermittent Fasting"),
      ("other", "Other"),
    ]),
    Question::new("nutrition_pref", MultiChoice, "Nutrition preferences (optional)").options(&[
      ("high_protein", "High-protein"),
      ("mediterranean", "Mediterranean-ish"),
      ("vegetarian", "Vegetarian"),
      ("no_strict_rules", "No strict rules"),
    ]),
    Question::new("double_runs", SingleChoice, "Run doubles on easy days? (optional)")
      .options(&[("yes", "Yes"), ("no", "No")])
      .help("Splits one easy day into a longer AM run and a shorter PM run."),
    Question::new("other_notes", Text, "Tell me more you'd like me to know")
      .placeholder("Travel schedule, disliked movements, time of day you train, injuries, foods you avoid, etc.")
      .help("Anything important or personal preferences that should shape your plan."),
  ];

  Questionnaire {
    coach: coach.to_string(),
    questions,
  }
}
