//! Visualization output for external observers.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::core::Pose2D;

/// The two pose sequences published each cycle: the plan transformed
/// into the costmap frame and the locally selected trajectory.
#[derive(Clone, Debug, Default)]
pub struct PlanVisualization {
    pub global_plan: Vec<Pose2D>,
    pub local_plan: Vec<Pose2D>,
}

/// Fan-out publisher for [`PlanVisualization`] frames.
///
/// Sends are non-blocking: a full channel drops the frame and a closed
/// one drops the subscriber, so observers can come and go without
/// affecting the control cycle.
#[derive(Default)]
pub struct LocalPlanPublisher {
    subscribers: Vec<Sender<PlanVisualization>>,
}

impl LocalPlanPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer; frames arrive on the returned channel.
    pub fn subscribe(&mut self) -> Receiver<PlanVisualization> {
        let (tx, rx) = bounded(4);
        self.subscribers.push(tx);
        rx
    }

    /// Offer a frame to every live subscriber.
    pub fn publish(&mut self, frame: &PlanVisualization) {
        self.subscribers.retain(|tx| {
            !matches!(
                tx.try_send(frame.clone()),
                Err(TrySendError::Disconnected(_))
            )
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers_is_noop() {
        let mut publisher = LocalPlanPublisher::new();
        publisher.publish(&PlanVisualization::default());
    }

    #[test]
    fn test_subscriber_receives_frames() {
        let mut publisher = LocalPlanPublisher::new();
        let rx = publisher.subscribe();

        let frame = PlanVisualization {
            global_plan: vec![Pose2D::new(1.0, 2.0, 0.0)],
            local_plan: vec![],
        };
        publisher.publish(&frame);

        let got = rx.try_recv().unwrap();
        assert_eq!(got.global_plan.len(), 1);
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let mut publisher = LocalPlanPublisher::new();
        let rx = publisher.subscribe();
        drop(rx);

        publisher.publish(&PlanVisualization::default());
        assert!(publisher.subscribers.is_empty());
    }

    #[test]
    fn test_full_channel_drops_frame_not_subscriber() {
        let mut publisher = LocalPlanPublisher::new();
        let rx = publisher.subscribe();

        for _ in 0..10 {
            publisher.publish(&PlanVisualization::default());
        }
        assert_eq!(publisher.subscribers.len(), 1);
        // Only the channel capacity worth of frames is retained
        assert_eq!(rx.len(), 4);
    }
}
