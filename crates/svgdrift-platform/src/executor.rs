use std::io::Write;

use serde::Serialize;
use svgdrift_core::{AnimationExecutor, AnimationPlan, HostResult, ShapeHandle, ShapeStyle};
use tracing::debug;

/// Logs every plan instead of playing it.
#[derive(Debug, Default)]
pub struct TracingExecutor {
    played: u64,
}

impl TracingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> u64 {
        self.played
    }
}

impl AnimationExecutor for TracingExecutor {
    fn play(&mut self, shape: &ShapeHandle, plan: &AnimationPlan) -> HostResult<()> {
        self.played += 1;
        let from = plan.keyframes.first().and_then(|k| k.transform);
        let to = plan.keyframes.last().and_then(|k| k.transform);
        debug!(
            "play #{} over {:?}: fill={} from={} to={}",
            self.played,
            plan.duration,
            shape
                .style()
                .fill
                .map(|fill| fill.to_css())
                .unwrap_or_default(),
            from.map(|t| t.to_css()).unwrap_or_default(),
            to.map(|t| t.to_css()).unwrap_or_default(),
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct PlayRecord<'a> {
    style: &'a ShapeStyle,
    plan: &'a AnimationPlan,
}

/// Writes one JSON object per played plan, for a host that animates
/// elsewhere (a browser, a compositor).
pub struct JsonExecutor<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonExecutor<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> AnimationExecutor for JsonExecutor<W> {
    fn play(&mut self, shape: &ShapeHandle, plan: &AnimationPlan) -> HostResult<()> {
        let record = PlayRecord {
            style: shape.style(),
            plan,
        };
        serde_json::to_writer(&mut self.writer, &record)?;
        writeln!(self.writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use std::time::Duration;
    use svgdrift_core::{Rgba, Template};

    #[test]
    fn json_lines_carry_style_and_plan() {
        let mut shape = Template::load(r#"<svg viewBox="0 0 1 1"><path d="M0 0"/></svg>"#)
            .unwrap()
            .clone_shape();
        shape.set_fill(Rgba::new(255.0, 0.0, 0.0, 0.5)).unwrap();
        shape.set_size(Vec2::new(20.0, 20.0));
        let plan =
            AnimationPlan::drift(90.0, 1.0, Vec2::new(3.0, -4.0), Duration::from_millis(1500));

        let mut executor = JsonExecutor::new(Vec::new());
        executor.play(&shape, &plan).unwrap();
        executor.play(&shape, &plan).unwrap();
        let output = String::from_utf8(executor.into_inner()).unwrap();

        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["style"]["width"], 20.0);
        assert_eq!(value["style"]["fill"]["a"], 0.5);
        assert_eq!(value["plan"]["duration_ms"], 1500.0);
        assert_eq!(value["plan"]["iterations"], 1);
        let keyframes = value["plan"]["keyframes"].as_array().unwrap();
        assert_eq!(keyframes.len(), 7);
        assert_eq!(keyframes[6]["transform"]["translate"], serde_json::json!([3.0, -4.0]));
        assert!(keyframes[1].get("transform").is_none());
    }

    #[test]
    fn tracing_executor_counts() {
        let shape = Template::load(r#"<svg viewBox="0 0 1 1"><path d="M0 0"/></svg>"#)
            .unwrap()
            .clone_shape();
        let plan = AnimationPlan::drift(0.0, 1.0, Vec2::ZERO, Duration::from_millis(10));
        let mut executor = TracingExecutor::new();
        executor.play(&shape, &plan).unwrap();
        assert_eq!(executor.played(), 1);
    }
}
