//! Progress prediction using linear regression (linfa)

use chrono::{Local, NaiveDate};
use linfa::prelude::*;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};

use super::Analytics;
use crate::session::WorkoutRecord;

/// Minimum training days required for fitting
const MIN_DATA_POINTS: usize = 3;

/// Daily-volume trend for one exercise
pub struct ProgressPredictor {
    slope: f64,
    intercept: f64,
    r2_score: f64,
    first_date: NaiveDate,
    /// (day, volume) series the model was fitted on
    series: Vec<(NaiveDate, f64)>,
}

/// Prediction result for display
#[derive(Debug, Clone)]
pub struct Prediction {
    pub daily_progress: f64,
    pub week_prediction: f64,
    pub month_prediction: f64,
    pub r2_score: f64,
    pub data_points: usize,
    /// Average daily volume over the last 7 days
    pub avg_7_days: Option<f64>,
}

impl ProgressPredictor {
    /// Fit a predictor on per-day volume of `exercise`
    pub fn train(workouts: &[WorkoutRecord], exercise: &str) -> Option<Self> {
        let series = Analytics::new(workouts.to_vec()).volume_by_day(exercise);
        Self::fit(series)
    }

    /// Fit on an already-shaped (day, volume) series
    pub fn fit(series: Vec<(NaiveDate, f64)>) -> Option<Self> {
        if series.len() < MIN_DATA_POINTS {
            return None;
        }

        let first_date = series.iter().map(|(d, _)| *d).min()?;

        // X = days since first session, Y = volume
        let x_data: Vec<f64> = series
            .iter()
            .map(|(d, _)| (*d - first_date).num_days() as f64)
            .collect();
        let y_data: Vec<f64> = series.iter().map(|(_, v)| *v).collect();

        let records = Array2::from_shape_vec((x_data.len(), 1), x_data).ok()?;
        let targets = Array1::from_vec(y_data);
        let dataset = Dataset::new(records, targets);

        let model = LinearRegression::default().fit(&dataset).ok()?;
        let slope = model.params()[0];
        let intercept = model.intercept();

        let predictions = model.predict(&dataset);
        let r2_score = predictions.r2(&dataset).unwrap_or(0.0);

        Some(Self {
            slope,
            intercept,
            r2_score,
            first_date,
            series,
        })
    }

    /// Predict daily volume `days_ahead` days from today
    pub fn predict_volume(&self, days_ahead: i64) -> f64 {
        let today = Local::now().date_naive();
        let x = (today - self.first_date).num_days() + days_ahead;
        self.slope * x as f64 + self.intercept
    }

    pub fn current_level(&self) -> f64 {
        self.predict_volume(0)
    }

    /// Get daily progress (slope)
    pub fn daily_progress(&self) -> f64 {
        self.slope
    }

    /// Get R2 score (model fit quality, 0-1)
    pub fn r2_score(&self) -> f64 {
        self.r2_score
    }

    pub fn data_points(&self) -> usize {
        self.series.len()
    }

    fn avg_last_days(&self, days: i64) -> Option<f64> {
        let cutoff = Local::now().date_naive() - chrono::Duration::days(days);
        let recent: Vec<f64> = self
            .series
            .iter()
            .filter(|(d, _)| *d >= cutoff)
            .map(|(_, v)| *v)
            .collect();

        if recent.is_empty() {
            None
        } else {
            Some(recent.iter().sum::<f64>() / recent.len() as f64)
        }
    }

    /// Get full prediction for display
    pub fn get_prediction(&self) -> Prediction {
        Prediction {
            daily_progress: self.slope,
            week_prediction: self.predict_volume(7),
            month_prediction: self.predict_volume(30),
            r2_score: self.r2_score,
            data_points: self.series.len(),
            avg_7_days: self.avg_last_days(7),
        }
    }

    /// Format prediction for CLI and bot output
    pub fn format_prediction(&self) -> String {
        let pred = self.get_prediction();

        let mut lines = vec!["--- Trend ---".to_string()];
        if let Some(avg7) = pred.avg_7_days {
            lines.push(format!("7-day average: {:.1}", avg7));
        }

        let trend = if pred.daily_progress >= 0.0 {
            format!("+{:.1}", pred.daily_progress)
        } else {
            format!("{:.1}", pred.daily_progress)
        };
        lines.push(format!("Trend: {} volume/day", trend));
        lines.push(format!("In a week: {:.0} (R² {:.2})", pred.week_prediction, pred.r2_score));

        lines.join("\n")
    }
}
