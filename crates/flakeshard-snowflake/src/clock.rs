use jiff::Timestamp;

pub trait Clock: Send + Sync {
    /// Returns the current time of the clock
    fn now(&self) -> Timestamp;
    /// Block and wait until the clock reaches the target time.
    fn wait_until(&self, target: Timestamp);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }

    fn wait_until(&self, target: Timestamp) {
        // Only ever asked to wait for the next millisecond boundary.
        while Timestamp::now() < target {
            std::hint::spin_loop();
        }
    }
}

#[cfg(any(test, feature = "test-clock"))]
pub mod test_clock {
    use crate::clock::Clock;
    use jiff::{SignedDuration, Timestamp};
    use std::sync::{Arc, Mutex};

    /// A manually driven clock.
    ///
    /// Clones share the same underlying time, so a test can keep a handle
    /// while the generator owns another.
    #[derive(Debug, Clone)]
    pub struct TestClock {
        inner: Arc<Mutex<TestClockState>>,
    }

    #[derive(Debug)]
    struct TestClockState {
        now: Timestamp,
        waits: usize,
    }

    impl TestClock {
        pub fn new(now: Timestamp) -> Self {
            Self {
                inner: Arc::new(Mutex::new(TestClockState { now, waits: 0 })),
            }
        }

        pub fn from_millisecond(millis: i64) -> Self {
            Self::new(Timestamp::from_millisecond(millis).expect("millisecond timestamp in range"))
        }

        /// Moves the clock to `now`, backwards or forwards.
        pub fn set(&self, now: Timestamp) {
            self.state().now = now;
        }

        pub fn advance(&self, by: SignedDuration) {
            let mut state = self.state();
            state.now = state
                .now
                .checked_add(by)
                .expect("advanced test clock stays in range");
        }

        /// Number of times a caller had to wait on this clock.
        pub fn waits(&self) -> usize {
            self.state().waits
        }

        fn state(&self) -> std::sync::MutexGuard<'_, TestClockState> {
            self.inner
                .lock()
                .expect("test clock lock should not be poisoned")
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> Timestamp {
            self.state().now
        }

        fn wait_until(&self, target: Timestamp) {
            let mut state = self.state();
            state.waits += 1;
            // just advance the clock to the target time;
            // we don't need to actually block since this is only used in tests
            if target > state.now {
                state.now = target;
            }
        }
    }

    #[test]
    fn test_clock_works() {
        // test that the clock starts at the given time
        let base = Timestamp::from_second(0).unwrap();
        let clock = TestClock::new(base);
        assert_eq!(clock.now(), base);

        // the clock should advance to the target time after wait_until
        let target = Timestamp::from_second(1000).unwrap();
        clock.wait_until(target);
        assert_eq!(clock.now(), target);
        assert_eq!(clock.waits(), 1);

        // and can be moved backwards explicitly
        clock.set(base);
        assert_eq!(clock.now(), base);
    }

    #[test]
    fn clones_share_time() {
        let clock = TestClock::from_millisecond(10);
        let handle = clock.clone();
        handle.advance(SignedDuration::from_millis(5));
        assert_eq!(clock.now().as_millisecond(), 15);
    }
}
