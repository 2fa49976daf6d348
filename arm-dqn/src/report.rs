//! Reward history and its plots.
//!
//! After training, the cumulative reward of every episode is written to a CSV
//! file with the header `episode,reward`, and four line plots are rendered
//! into PNG files:
//!
//! * `reward_plot.png`: the raw reward per episode,
//! * `smoothed_reward_plot.png`: its moving average,
//! * `rps_plot.png`: reward per step,
//! * `smoothed_rps_plot.png`: the moving average of reward per step.
use anyhow::{ensure, Result};
use image::{Rgb, RgbImage};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the reward history.
pub const REWARD_HISTORY_FILE: &str = "reward_history.csv";

/// Window of the moving average in the smoothed plots.
pub const SMOOTHING_WINDOW: usize = 100;

#[derive(Debug, Serialize, Deserialize)]
struct RewardRow {
    episode: usize,
    reward: f32,
}

/// Cumulative reward of each training episode.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RewardHistory {
    rewards: Vec<f32>,
}

impl From<Vec<f32>> for RewardHistory {
    fn from(rewards: Vec<f32>) -> Self {
        Self { rewards }
    }
}

impl RewardHistory {
    /// Returns the rewards in episode order.
    pub fn rewards(&self) -> &[f32] {
        &self.rewards
    }

    /// Returns the number of episodes.
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    /// Returns `true` if no episode is recorded.
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// Returns the reward per step of each episode.
    pub fn reward_per_step(&self, steps_per_episode: usize) -> Vec<f32> {
        reward_per_step(&self.rewards, steps_per_episode)
    }

    /// Writes the history as CSV with the header `episode,reward`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path.as_ref())?;
        for (episode, &reward) in self.rewards.iter().enumerate() {
            wtr.serialize(RewardRow { episode, reward })?;
        }
        wtr.flush()?;
        info!("Saved reward history in {:?}", path.as_ref());
        Ok(())
    }

    /// Reads a history written by [`RewardHistory::save`].
    ///
    /// Episodes must be numbered consecutively from zero.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut rdr = csv::Reader::from_path(path.as_ref())?;
        let mut rewards = Vec::new();
        for row in rdr.deserialize() {
            let row: RewardRow = row?;
            ensure!(
                row.episode == rewards.len(),
                "Expected episode {}, found {}",
                rewards.len(),
                row.episode
            );
            rewards.push(row.reward);
        }
        info!("Loaded reward history from {:?}", path.as_ref());
        Ok(Self { rewards })
    }

    /// Renders the four reward plots into `dir` and returns their paths.
    pub fn save_plots(
        &self,
        dir: impl AsRef<Path>,
        steps_per_episode: usize,
    ) -> Result<Vec<PathBuf>> {
        let rps = self.reward_per_step(steps_per_episode);
        let series = [
            ("reward_plot.png", self.rewards.clone()),
            (
                "smoothed_reward_plot.png",
                moving_average(&self.rewards, SMOOTHING_WINDOW),
            ),
            ("smoothed_rps_plot.png", moving_average(&rps, SMOOTHING_WINDOW)),
            ("rps_plot.png", rps),
        ];

        let plot = LinePlot::default();
        let mut paths = Vec::with_capacity(series.len());
        for (name, values) in series.iter() {
            let path = dir.as_ref().join(name);
            plot.save(values, &path)?;
            paths.push(path);
        }
        Ok(paths)
    }
}

/// Divides each cumulative reward by the number of steps in an episode.
pub fn reward_per_step(rewards: &[f32], steps_per_episode: usize) -> Vec<f32> {
    rewards
        .iter()
        .map(|r| r / steps_per_episode as f32)
        .collect()
}

/// Moving average over full windows only.
///
/// The output has `values.len() - window + 1` elements, and is empty if
/// `values` is shorter than `window` or `window` is zero.
pub fn moving_average(values: &[f32], window: usize) -> Vec<f32> {
    if window == 0 || values.len() < window {
        return Vec::new();
    }
    values
        .windows(window)
        .map(|w| w.iter().sum::<f32>() / window as f32)
        .collect()
}

/// Renders a series as a polyline over episode index.
pub struct LinePlot {
    width: u32,
    height: u32,
    margin: u32,
    background: Rgb<u8>,
    axis: Rgb<u8>,
    zero: Rgb<u8>,
    line: Rgb<u8>,
}

impl Default for LinePlot {
    fn default() -> Self {
        Self {
            width: 800,
            height: 480,
            margin: 40,
            background: Rgb([255, 255, 255]),
            axis: Rgb([0, 0, 0]),
            zero: Rgb([200, 200, 200]),
            line: Rgb([31, 119, 180]),
        }
    }
}

impl LinePlot {
    /// Sets the size of the image in pixels.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Sets the margin between the border of the image and the axes.
    pub fn margin(mut self, v: u32) -> Self {
        self.margin = v;
        self
    }

    /// Renders `values` into an image.
    ///
    /// An empty series gives the axes only. Non-finite values are skipped.
    pub fn render(&self, values: &[f32]) -> RgbImage {
        let mut img = RgbImage::from_pixel(self.width, self.height, self.background);
        if self.width <= 2 * self.margin + 1 || self.height <= 2 * self.margin + 1 {
            return img;
        }

        let left = self.margin as i64;
        let right = (self.width - 1 - self.margin) as i64;
        let top = self.margin as i64;
        let bottom = (self.height - 1 - self.margin) as i64;

        let finite = values.iter().cloned().filter(|v| v.is_finite());
        let (min, max) = finite.fold((f32::MAX, f32::MIN), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if min <= max {
            let (min, max) = if max - min > f32::EPSILON {
                (min, max)
            } else {
                (min - 0.5, max + 0.5)
            };
            let to_y = |v: f32| {
                bottom - ((v - min) / (max - min) * (bottom - top) as f32).round() as i64
            };
            let n = values.len();
            let to_x = |i: usize| {
                if n > 1 {
                    left + (i as f32 / (n - 1) as f32 * (right - left) as f32).round() as i64
                } else {
                    left
                }
            };

            if min < 0.0 && max > 0.0 {
                let y = to_y(0.0);
                draw_line(&mut img, (left, y), (right, y), self.zero);
            }

            let mut prev = None;
            for (i, &v) in values.iter().enumerate() {
                if !v.is_finite() {
                    prev = None;
                    continue;
                }
                let p = (to_x(i), to_y(v));
                match prev {
                    Some(q) => draw_line(&mut img, q, p, self.line),
                    None => put_pixel(&mut img, p, self.line),
                }
                prev = Some(p);
            }
        }

        draw_line(&mut img, (left, bottom), (right, bottom), self.axis);
        draw_line(&mut img, (left, top), (left, bottom), self.axis);
        img
    }

    /// Renders `values` and writes the image to `path`.
    ///
    /// The format follows the extension of `path`.
    pub fn save(&self, values: &[f32], path: impl AsRef<Path>) -> Result<()> {
        self.render(values).save(path.as_ref())?;
        info!("Saved plot in {:?}", path.as_ref());
        Ok(())
    }
}

fn put_pixel(img: &mut RgbImage, (x, y): (i64, i64), color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

// Bresenham
fn draw_line(img: &mut RgbImage, (x0, y0): (i64, i64), (x1, y1): (i64, i64), color: Rgb<u8>) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let (mut x, mut y) = (x0, y0);
    let mut err = dx + dy;

    loop {
        put_pixel(img, (x, y), color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempdir::TempDir;

    #[test]
    fn test_moving_average_valid_windows() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(moving_average(&values, 2), vec![1.5, 2.5, 3.5, 4.5]);
        assert_eq!(moving_average(&values, 5), vec![3.0]);
        assert!(moving_average(&values, 6).is_empty());
        assert!(moving_average(&values, 0).is_empty());
    }

    #[test]
    fn test_reward_per_step() {
        let history = RewardHistory::from(vec![50.0, -25.0, 0.0]);
        assert_eq!(history.reward_per_step(50), vec![1.0, -0.5, 0.0]);
    }

    #[test]
    fn test_csv_has_header_and_one_row_per_episode() -> Result<()> {
        let dir = TempDir::new("reward_history")?;
        let path = dir.path().join(REWARD_HISTORY_FILE);
        let history = RewardHistory::from(vec![1.5, -2.0, 3.25]);
        history.save(&path)?;

        let text = fs::read_to_string(&path)?;
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines, vec!["episode,reward", "0,1.5", "1,-2.0", "2,3.25"]);

        assert_eq!(RewardHistory::load(&path)?, history);
        Ok(())
    }

    #[test]
    fn test_load_rejects_gaps_in_episodes() -> Result<()> {
        let dir = TempDir::new("reward_history")?;
        let path = dir.path().join(REWARD_HISTORY_FILE);
        fs::write(&path, "episode,reward\n0,1.0\n2,1.0\n")?;
        assert!(RewardHistory::load(&path).is_err());
        Ok(())
    }

    #[test]
    fn test_render_draws_axes_and_line() {
        let plot = LinePlot::default().size(100, 60).margin(10);
        let img = plot.render(&[0.0, 1.0, 0.5]);
        assert_eq!(img.dimensions(), (100, 60));
        // Corner of the axes.
        assert_eq!(*img.get_pixel(10, 49), Rgb([0, 0, 0]));
        // The maximum lands on the top edge of the plot area.
        assert_eq!(*img.get_pixel(50, 10), Rgb([31, 119, 180]));
    }

    #[test]
    fn test_render_degenerate_series() {
        let plot = LinePlot::default().size(100, 60).margin(10);
        let empty = plot.render(&[]);
        assert_eq!(*empty.get_pixel(50, 30), Rgb([255, 255, 255]));

        // A constant series is drawn through the middle, broken at NaN.
        let flat = plot.render(&[2.0, 2.0, f32::NAN, 2.0]);
        assert_eq!(*flat.get_pixel(20, 29), Rgb([31, 119, 180]));
        assert_eq!(*flat.get_pixel(50, 29), Rgb([255, 255, 255]));

        let tiny = LinePlot::default().size(10, 10).margin(10).render(&[1.0]);
        assert_eq!(tiny.dimensions(), (10, 10));
    }

    #[test]
    fn test_save_plots_writes_four_png() -> Result<()> {
        let dir = TempDir::new("reward_plots")?;
        let history = RewardHistory::from((0..150).map(|i| (i % 7) as f32).collect::<Vec<_>>());
        let paths = history.save_plots(dir.path(), 50)?;

        let names = paths
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                "reward_plot.png",
                "smoothed_reward_plot.png",
                "smoothed_rps_plot.png",
                "rps_plot.png"
            ]
        );
        for path in paths.iter() {
            assert_eq!(image::open(path)?.to_rgb8().dimensions(), (800, 480));
        }
        Ok(())
    }
}
