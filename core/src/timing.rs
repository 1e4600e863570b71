//! Scoped timing: enter a scope, record a start instant, and on release — on
//! every exit path, including early-return — append the elapsed seconds to a
//! caller-supplied sink.

use std::time::Instant;

/// A guard that appends its elapsed wall-clock time (in seconds) to `sink`
/// when dropped, regardless of how the scope is exited.
pub struct Timing<'a> {
    start: Instant,
    sink: &'a mut Vec<(String, f64)>,
    name: String,
}

impl<'a> Timing<'a> {
    pub fn start(name: impl Into<String>, sink: &'a mut Vec<(String, f64)>) -> Self {
        Timing {
            start: Instant::now(),
            sink,
            name: name.into(),
        }
    }
}

impl Drop for Timing<'_> {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed().as_secs_f64();
        self.sink.push((std::mem::take(&mut self.name), elapsed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_on_drop_even_on_early_return() {
        fn run(sink: &mut Vec<(String, f64)>) {
            let _t = Timing::start("probe", sink);
            return;
        }

        let mut sink = Vec::new();
        run(&mut sink);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].0, "probe");
    }
}
