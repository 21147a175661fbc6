use instant::Instant;

pub fn elapsed_seconds(since: Instant) -> f64 {
    let dt = since.elapsed();
    (dt.as_secs() as f64) + (f64::from(dt.subsec_nanos()) * 1e-9)
}

fn prettyprint_time(seconds: f64) -> String {
    format!("{:.4}s", seconds)
}

/// Hierarchical stopwatch for the pipeline stages. Print-as-you-go, plus
/// warnings are collected and dumped at the end, so they don't get lost in
/// the progress output.
pub struct Timer {
    name: String,
    started_at: Instant,
    stack: Vec<(String, Instant)>,
    iter: Option<(String, usize, usize, Instant)>,
    warnings: Vec<String>,
}

impl Timer {
    pub fn new(name: &str) -> Timer {
        println!("- {}", name);
        Timer {
            name: name.to_string(),
            started_at: Instant::now(),
            stack: Vec::new(),
            iter: None,
            warnings: Vec::new(),
        }
    }

    pub fn start(&mut self, label: &str) {
        self.stack.push((label.to_string(), Instant::now()));
    }

    pub fn stop(&mut self, label: &str) {
        let (top, since) = self.stack.pop().expect("Timer::stop without start");
        assert_eq!(top, label, "Timer::stop({}) doesn't match start({})", label, top);
        println!(
            "{}- {}... {}",
            "  ".repeat(self.stack.len() + 1),
            label,
            prettyprint_time(elapsed_seconds(since))
        );
    }

    pub fn start_iter(&mut self, label: &str, total: usize) {
        assert!(self.iter.is_none(), "Timer::start_iter while another is active");
        if total == 0 {
            return;
        }
        self.iter = Some((label.to_string(), 0, total, Instant::now()));
    }

    pub fn next(&mut self) {
        let (label, processed, total, since) = self.iter.take().expect("Timer::next without start_iter");
        let processed = processed + 1;
        if processed == total {
            println!(
                "{}- {} ({})... {}",
                "  ".repeat(self.stack.len() + 1),
                label,
                total,
                prettyprint_time(elapsed_seconds(since))
            );
        } else {
            self.iter = Some((label, processed, total, since));
        }
    }

    pub fn warn(&mut self, line: String) {
        self.warnings.push(line);
    }

    /// Prints the total elapsed time and all collected warnings.
    pub fn done(mut self) {
        if let Some((label, processed, total, _)) = self.iter.take() {
            panic!("Timer dropped with {} at {}/{}", label, processed, total);
        }
        assert!(self.stack.is_empty(), "Timer dropped with unfinished stages");
        println!(
            "- {} took {}",
            self.name,
            prettyprint_time(elapsed_seconds(self.started_at))
        );
        if !self.warnings.is_empty() {
            println!("{} warnings:", self.warnings.len());
            for line in self.warnings.drain(..) {
                println!("  - {}", line);
            }
        }
    }
}
