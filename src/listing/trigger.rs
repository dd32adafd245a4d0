use serde::Deserialize;

/// Scroll geometry of a list region, measured in rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollMetrics {
    /// Rows of loaded content.
    pub content_len: usize,
    /// First visible row.
    pub offset: usize,
    /// Rows the region can show at once.
    pub viewport_len: usize,
}

impl ScrollMetrics {
    pub fn distance_to_bottom(&self) -> usize {
        self.content_len
            .saturating_sub(self.offset)
            .saturating_sub(self.viewport_len)
    }
}

/// Detects the user's intent to see more rows.
///
/// Implementations fire at most once per crossing into their zone. They do
/// not know whether a fetch is running; the gate filters repeats.
pub trait ContinuationSignal: Send + std::fmt::Debug {
    /// Returns true when a continuation should be attempted.
    fn observe(&mut self, metrics: ScrollMetrics) -> bool;

    /// Called whenever the list contents change.
    fn list_changed(&mut self, has_more: bool);

    /// Stop producing signals for good.
    fn disconnect(&mut self);
}

/// Which continuation signal a list uses, as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TriggerKind {
    Viewport {
        #[serde(default = "default_margin")]
        margin: usize,
    },
    Scroll {
        #[serde(default = "default_threshold")]
        threshold: usize,
    },
}

fn default_margin() -> usize {
    2
}

fn default_threshold() -> usize {
    3
}

impl TriggerKind {
    /// Scroll-distance trigger with the default threshold.
    pub fn scroll() -> Self {
        TriggerKind::Scroll {
            threshold: default_threshold(),
        }
    }

    pub fn build(self) -> Box<dyn ContinuationSignal> {
        match self {
            TriggerKind::Viewport { margin } => Box::new(ViewportProximity::new(margin)),
            TriggerKind::Scroll { threshold } => Box::new(ScrollDistance::new(threshold)),
        }
    }
}

/// Fires when the sentinel row after the last item comes within `margin`
/// rows of the visible window.
#[derive(Debug)]
pub struct ViewportProximity {
    margin: usize,
    observing: bool,
    armed: bool,
}

impl ViewportProximity {
    pub fn new(margin: usize) -> Self {
        Self {
            margin,
            observing: true,
            armed: true,
        }
    }

    fn sentinel_visible(&self, metrics: ScrollMetrics) -> bool {
        // Sentinel sits at index `content_len`
        metrics.offset + metrics.viewport_len + self.margin > metrics.content_len
    }
}

impl ContinuationSignal for ViewportProximity {
    fn observe(&mut self, metrics: ScrollMetrics) -> bool {
        if !self.observing {
            return false;
        }
        if !self.sentinel_visible(metrics) {
            self.armed = true;
            return false;
        }
        std::mem::replace(&mut self.armed, false)
    }

    fn list_changed(&mut self, has_more: bool) {
        self.observing = has_more;
        self.armed = true;
    }

    fn disconnect(&mut self) {
        self.observing = false;
    }
}

/// Fires when the distance to the bottom of a bounded region drops under
/// `threshold` rows.
#[derive(Debug)]
pub struct ScrollDistance {
    threshold: usize,
    connected: bool,
    armed: bool,
}

impl ScrollDistance {
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold,
            connected: true,
            armed: true,
        }
    }
}

impl ContinuationSignal for ScrollDistance {
    fn observe(&mut self, metrics: ScrollMetrics) -> bool {
        if !self.connected {
            return false;
        }
        if metrics.distance_to_bottom() >= self.threshold {
            self.armed = true;
            return false;
        }
        std::mem::replace(&mut self.armed, false)
    }

    fn list_changed(&mut self, _has_more: bool) {
        self.armed = true;
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }
}
