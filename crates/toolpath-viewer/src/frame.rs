//! Continuous redraw driver bound to the display's refresh signal.
//!
//! The driver never captures render state. Every tick receives the current
//! callbacks by `&mut`, so settings changed between frames are always seen.

/// What the driver calls into on every refresh.
pub trait FrameCallbacks {
    /// Identity of the render target (e.g. the graphics context).
    type Target: Copy + PartialEq + std::fmt::Debug;

    /// Resolves the current target, or `None` when there is nothing to draw
    /// into yet. `None` skips the frame.
    fn resolve_target(&mut self) -> Option<Self::Target>;

    /// Runs the first time a target is seen and whenever it changes.
    fn setup(&mut self, target: Self::Target) -> anyhow::Result<()>;

    /// Draws one frame into `target`.
    fn render(&mut self, target: Self::Target) -> anyhow::Result<()>;
}

#[derive(Debug)]
pub enum TickOutcome {
    Rendered,
    /// No target available; try again on the next refresh.
    Skipped,
    Cancelled,
    Failed(anyhow::Error),
}

#[derive(Debug)]
pub struct FrameDriver<T> {
    pending: bool,
    cancelled: bool,
    set_up_for: Option<T>,
    frames: u64,
}

impl<T: Copy + PartialEq + std::fmt::Debug> FrameDriver<T> {
    pub fn new() -> Self {
        Self {
            pending: false,
            cancelled: false,
            set_up_for: None,
            frames: 0,
        }
    }

    /// Asks for the next refresh callback unless one is already pending.
    pub fn schedule(&mut self, request: impl FnOnce()) {
        if !self.cancelled && !self.pending {
            request();
            self.pending = true;
        }
    }

    /// One draw attempt for one refresh signal.
    pub fn tick<C>(&mut self, callbacks: &mut C) -> TickOutcome
    where
        C: FrameCallbacks<Target = T>,
    {
        self.pending = false;
        if self.cancelled {
            return TickOutcome::Cancelled;
        }

        let Some(target) = callbacks.resolve_target() else {
            return TickOutcome::Skipped;
        };

        if self.set_up_for != Some(target) {
            log::debug!("Frame driver setting up target {:?}", target);
            if let Err(err) = callbacks.setup(target) {
                return TickOutcome::Failed(err);
            }
            self.set_up_for = Some(target);
        }

        match callbacks.render(target) {
            Ok(()) => {
                self.frames += 1;
                TickOutcome::Rendered
            }
            Err(err) => TickOutcome::Failed(err),
        }
    }

    /// Stops scheduling and turns further ticks into no-ops.
    pub fn cancel(&mut self) {
        if !self.cancelled {
            log::debug!("Frame driver cancelled after {} frames", self.frames);
        }
        self.cancelled = true;
        self.pending = false;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        target: Option<u32>,
        setups: Vec<u32>,
        renders: Vec<u32>,
        clear_color: f32,
        seen_colors: Vec<f32>,
    }

    impl FrameCallbacks for Recorder {
        type Target = u32;

        fn resolve_target(&mut self) -> Option<u32> {
            self.target
        }

        fn setup(&mut self, target: u32) -> anyhow::Result<()> {
            self.setups.push(target);
            Ok(())
        }

        fn render(&mut self, target: u32) -> anyhow::Result<()> {
            self.renders.push(target);
            self.seen_colors.push(self.clear_color);
            Ok(())
        }
    }

    #[test]
    fn skips_without_target() {
        let mut driver = FrameDriver::new();
        let mut recorder = Recorder::default();

        assert!(matches!(driver.tick(&mut recorder), TickOutcome::Skipped));
        assert!(recorder.renders.is_empty());
        assert_eq!(driver.frames(), 0);
    }

    #[test]
    fn sets_up_once_per_target() {
        let mut driver = FrameDriver::new();
        let mut recorder = Recorder {
            target: Some(1),
            ..Recorder::default()
        };

        driver.tick(&mut recorder);
        driver.tick(&mut recorder);
        recorder.target = Some(2);
        driver.tick(&mut recorder);

        assert_eq!(recorder.setups, vec![1, 2]);
        assert_eq!(recorder.renders, vec![1, 1, 2]);
        assert_eq!(driver.frames(), 3);
    }

    #[test]
    fn reads_latest_state_each_tick() {
        let mut driver = FrameDriver::new();
        let mut recorder = Recorder {
            target: Some(0),
            ..Recorder::default()
        };

        driver.tick(&mut recorder);
        recorder.clear_color = 0.5;
        driver.tick(&mut recorder);

        assert_eq!(recorder.seen_colors, vec![0.0, 0.5]);
    }

    #[test]
    fn schedule_coalesces_until_tick() {
        let mut driver: FrameDriver<u32> = FrameDriver::new();
        let mut requests = 0;

        driver.schedule(|| requests += 1);
        driver.schedule(|| requests += 1);
        assert_eq!(requests, 1);

        driver.tick(&mut Recorder::default());
        driver.schedule(|| requests += 1);
        assert_eq!(requests, 2);
    }

    #[test]
    fn cancel_stops_everything() {
        let mut driver = FrameDriver::new();
        let mut recorder = Recorder {
            target: Some(7),
            ..Recorder::default()
        };
        let mut requests = 0;

        driver.cancel();
        driver.schedule(|| requests += 1);

        assert_eq!(requests, 0);
        assert!(matches!(driver.tick(&mut recorder), TickOutcome::Cancelled));
        assert!(recorder.renders.is_empty());
        assert!(driver.is_cancelled());
    }

    #[test]
    fn failed_setup_is_retried_on_next_tick() {
        struct FailingSetup {
            attempts: u32,
        }

        impl FrameCallbacks for FailingSetup {
            type Target = u8;

            fn resolve_target(&mut self) -> Option<u8> {
                Some(0)
            }

            fn setup(&mut self, _target: u8) -> anyhow::Result<()> {
                self.attempts += 1;
                anyhow::bail!("no surface")
            }

            fn render(&mut self, _target: u8) -> anyhow::Result<()> {
                Ok(())
            }
        }

        let mut driver = FrameDriver::new();
        let mut callbacks = FailingSetup { attempts: 0 };

        assert!(matches!(driver.tick(&mut callbacks), TickOutcome::Failed(_)));
        assert!(matches!(driver.tick(&mut callbacks), TickOutcome::Failed(_)));
        assert_eq!(callbacks.attempts, 2);
    }
}
