use std::time::Duration;
use tokio::time::Instant;

/// Ping cadence and the read/write deadlines derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepaliveConfig {
    pub ping_period: Duration,
    /// Read deadline window; must exceed `ping_period` so one probe can be missed.
    pub pong_wait: Duration,
    pub write_wait: Duration,
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            ping_period: Duration::from_secs(60),
            pong_wait: Duration::from_secs(70),
            write_wait: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Alive,
    Probing,
    Dead,
}

/// Liveness of one connection, shared by its read and write halves.
#[derive(Debug)]
pub struct Keepalive {
    state: Liveness,
    read_deadline: Instant,
    pong_wait: Duration,
}

impl Keepalive {
    pub fn new(config: &KeepaliveConfig, now: Instant) -> Self {
        Self {
            state: Liveness::Alive,
            read_deadline: now + config.pong_wait,
            pong_wait: config.pong_wait,
        }
    }

    pub fn state(&self) -> Liveness {
        self.state
    }

    pub fn read_deadline(&self) -> Instant {
        self.read_deadline
    }

    pub fn probe_sent(&mut self) {
        if self.state == Liveness::Alive {
            self.state = Liveness::Probing;
        }
    }

    /// A pong or any other frame from the peer.
    pub fn heard_from_peer(&mut self, now: Instant) {
        if self.state == Liveness::Dead {
            return;
        }
        self.state = Liveness::Alive;
        self.read_deadline = now + self.pong_wait;
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.read_deadline
    }

    pub fn mark_dead(&mut self) {
        self.state = Liveness::Dead;
    }
}
