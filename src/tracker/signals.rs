use tokio::sync::watch;

/// One-shot event value. `Pending` carries the payload until the consumer
/// acknowledges it, after which the signal reads `Consumed`. A consumed
/// signal never replays on a passive re-subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OneShot<T> {
    Pending(T),
    Consumed,
}

impl<T> OneShot<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, OneShot::Pending(_))
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            OneShot::Pending(payload) => Some(payload),
            OneShot::Consumed => None,
        }
    }
}

/// Owner side of a one-shot signal. Firing replaces any unacknowledged
/// payload; acknowledging resets to the inert value.
pub(crate) struct OneShotSignal<T> {
    tx: watch::Sender<OneShot<T>>,
}

impl<T> OneShotSignal<T> {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(OneShot::Consumed);
        Self { tx }
    }

    pub fn fire(&self, payload: T) {
        self.tx.send_replace(OneShot::Pending(payload));
    }

    pub fn acknowledge(&self) {
        self.tx.send_replace(OneShot::Consumed);
    }

    pub fn subscribe(&self) -> watch::Receiver<OneShot<T>> {
        self.tx.subscribe()
    }
}
