use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::error::QueueError;
use crate::models::{JoinResponse, PositionResponse, QueueStats, QueueTicket, TicketStatus};

/// `max(0, position - 1) * avg_service_minutes`.
pub fn estimate_wait(position: usize, avg_service_minutes: u32) -> u32 {
    let ahead = u32::try_from(position.saturating_sub(1)).unwrap_or(u32::MAX);
    ahead.saturating_mul(avg_service_minutes)
}

/// One doctor's queue. Tickets are kept in join order.
#[derive(Debug, Default)]
pub struct DoctorQueue {
    tickets: Vec<QueueTicket>,
    /// Tickets still CALLED, oldest call first.
    called_order: Vec<Uuid>,
    last_created_at: Option<DateTime<Utc>>,
}

impl DoctorQueue {
    /// Strictly increasing join stamp, even within one clock tick.
    fn next_created_at(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_created_at {
            Some(previous) if now <= previous => previous + Duration::microseconds(1),
            _ => now,
        };
        self.last_created_at = Some(stamp);
        stamp
    }

    pub fn waiting(&self) -> Vec<&QueueTicket> {
        let mut waiting: Vec<&QueueTicket> = self
            .tickets
            .iter()
            .filter(|ticket| ticket.status == TicketStatus::Waiting)
            .collect();
        waiting.sort_by_key(|ticket| ticket.queue_key());
        waiting
    }

    /// 1-based rank among WAITING tickets.
    pub fn position_of(&self, ticket_id: Uuid) -> Option<usize> {
        self.waiting()
            .iter()
            .position(|ticket| ticket.id == ticket_id)
            .map(|index| index + 1)
    }

    fn open_ticket_for(&self, patient_id: Uuid) -> Option<&QueueTicket> {
        self.tickets
            .iter()
            .find(|ticket| ticket.patient_id == patient_id && ticket.status.is_open())
    }

    fn get(&self, ticket_id: Uuid) -> Option<&QueueTicket> {
        self.tickets.iter().find(|ticket| ticket.id == ticket_id)
    }

    fn get_mut(&mut self, ticket_id: Uuid) -> Option<&mut QueueTicket> {
        self.tickets.iter_mut().find(|ticket| ticket.id == ticket_id)
    }

    fn forget_call(&mut self, ticket_id: Uuid) {
        self.called_order.retain(|id| *id != ticket_id);
    }

    /// Most recently called ticket that is still CALLED.
    pub fn current(&self) -> Option<&QueueTicket> {
        self.called_order
            .iter()
            .rev()
            .filter_map(|id| self.get(*id))
            .find(|ticket| ticket.status == TicketStatus::Called)
    }
}

fn transition(ticket: &mut QueueTicket, to: TicketStatus) -> Result<(), QueueError> {
    if !ticket.status.can_transition_to(to) {
        return Err(QueueError::InvalidStatusTransition {
            from: ticket.status,
            to,
        });
    }

    let now = Utc::now();
    match to {
        TicketStatus::Called => ticket.called_at = Some(now),
        TicketStatus::Completed | TicketStatus::Cancelled => ticket.completed_at = Some(now),
        TicketStatus::Waiting => {}
    }
    ticket.status = to;
    Ok(())
}

/// Capacity-bounded walk-in queues keyed by doctor.
///
/// Every mutation of one doctor's queue runs under that doctor's mutex; the
/// outer maps are only locked long enough to find an entry.
pub struct QueueCoordinator {
    queues: RwLock<HashMap<Uuid, Arc<Mutex<DoctorQueue>>>>,
    ticket_index: RwLock<HashMap<Uuid, Uuid>>,
    max_waiting: usize,
    avg_service_minutes: u32,
}

impl QueueCoordinator {
    pub fn new(max_waiting: usize, avg_service_minutes: u32) -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            ticket_index: RwLock::new(HashMap::new()),
            max_waiting,
            avg_service_minutes,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.queue_max_waiting, config.queue_avg_service_minutes)
    }

    async fn lock(&self, doctor_id: Uuid) -> OwnedMutexGuard<DoctorQueue> {
        let existing = self.queues.read().await.get(&doctor_id).cloned();
        let entry = match existing {
            Some(entry) => entry,
            None => self.queues.write().await.entry(doctor_id).or_default().clone(),
        };
        entry.lock_owned().await
    }

    async fn lock_for_ticket(&self, ticket_id: Uuid) -> Result<OwnedMutexGuard<DoctorQueue>, QueueError> {
        let doctor_id = self
            .ticket_index
            .read()
            .await
            .get(&ticket_id)
            .copied()
            .ok_or(QueueError::TicketNotFound(ticket_id))?;
        Ok(self.lock(doctor_id).await)
    }

    pub async fn join(&self, doctor_id: Uuid, patient_id: Uuid) -> Result<JoinResponse, QueueError> {
        let mut queue = self.lock(doctor_id).await;

        if let Some(existing) = queue.open_ticket_for(patient_id) {
            return Err(QueueError::DuplicateTicket { ticket_id: existing.id });
        }

        let waiting = queue.waiting().len();
        if waiting >= self.max_waiting {
            warn!("Queue for doctor {} is full ({} waiting)", doctor_id, waiting);
            return Err(QueueError::QueueFull {
                doctor_id,
                max: self.max_waiting,
            });
        }

        let created_at = queue.next_created_at();
        let ticket = QueueTicket::new(doctor_id, patient_id, created_at);
        queue.tickets.push(ticket.clone());
        self.ticket_index.write().await.insert(ticket.id, doctor_id);

        let position = queue.position_of(ticket.id).unwrap_or(waiting + 1);
        info!("Patient {} joined queue of doctor {} at position {}", patient_id, doctor_id, position);

        Ok(JoinResponse { ticket, position })
    }

    /// Calls the oldest WAITING ticket. Earlier CALLED tickets stay CALLED.
    pub async fn call_next(&self, doctor_id: Uuid) -> Result<Option<QueueTicket>, QueueError> {
        let mut queue = self.lock(doctor_id).await;

        let Some(next_id) = queue.waiting().first().map(|ticket| ticket.id) else {
            debug!("No waiting tickets for doctor {}", doctor_id);
            return Ok(None);
        };

        let ticket = queue.get_mut(next_id).ok_or(QueueError::TicketNotFound(next_id))?;
        transition(ticket, TicketStatus::Called)?;
        let called = ticket.clone();
        queue.called_order.push(next_id);

        info!("Doctor {} called ticket {} (patient {})", doctor_id, called.id, called.patient_id);
        Ok(Some(called))
    }

    pub async fn complete(&self, ticket_id: Uuid) -> Result<QueueTicket, QueueError> {
        self.move_ticket(ticket_id, TicketStatus::Completed).await
    }

    pub async fn cancel(&self, ticket_id: Uuid) -> Result<QueueTicket, QueueError> {
        self.move_ticket(ticket_id, TicketStatus::Cancelled).await
    }

    async fn move_ticket(&self, ticket_id: Uuid, to: TicketStatus) -> Result<QueueTicket, QueueError> {
        let mut queue = self.lock_for_ticket(ticket_id).await?;
        let ticket = queue.get_mut(ticket_id).ok_or(QueueError::TicketNotFound(ticket_id))?;

        transition(ticket, to)?;
        let moved = ticket.clone();
        if to.is_terminal() {
            queue.forget_call(ticket_id);
        }
        info!("Ticket {} of doctor {} is now {}", moved.id, moved.doctor_id, to);
        Ok(moved)
    }

    pub async fn ticket(&self, ticket_id: Uuid) -> Result<QueueTicket, QueueError> {
        let queue = self.lock_for_ticket(ticket_id).await?;
        queue.get(ticket_id).cloned().ok_or(QueueError::TicketNotFound(ticket_id))
    }

    pub async fn get_position(&self, ticket_id: Uuid) -> Result<PositionResponse, QueueError> {
        let queue = self.lock_for_ticket(ticket_id).await?;
        let ticket = queue.get(ticket_id).cloned().ok_or(QueueError::TicketNotFound(ticket_id))?;

        let position = queue.position_of(ticket_id);
        Ok(PositionResponse {
            ticket,
            position,
            estimated_wait_minutes: position.map(|p| estimate_wait(p, self.avg_service_minutes)),
        })
    }

    pub async fn current(&self, doctor_id: Uuid) -> Option<QueueTicket> {
        self.lock(doctor_id).await.current().cloned()
    }

    /// WAITING tickets in FIFO order.
    pub async fn waiting(&self, doctor_id: Uuid) -> Vec<QueueTicket> {
        self.lock(doctor_id).await.waiting().into_iter().cloned().collect()
    }

    pub async fn stats(&self, doctor_id: Uuid) -> QueueStats {
        let waiting = self.lock(doctor_id).await.waiting().len();
        QueueStats::new(waiting, self.max_waiting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_estimates() {
        assert_eq!(estimate_wait(1, 5), 0);
        assert_eq!(estimate_wait(3, 5), 10);
        assert_eq!(estimate_wait(0, 5), 0);
        assert_eq!(estimate_wait(4, 12), 36);
    }

    #[test]
    fn join_stamps_are_strictly_increasing() {
        let mut queue = DoctorQueue::default();
        let stamps: Vec<_> = (0..50).map(|_| queue.next_created_at()).collect();

        for pair in stamps.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn transition_stamps_times() {
        let mut ticket = QueueTicket::new(Uuid::new_v4(), Uuid::new_v4(), Utc::now());

        transition(&mut ticket, TicketStatus::Called).unwrap();
        assert!(ticket.called_at.is_some());
        assert!(ticket.completed_at.is_none());

        transition(&mut ticket, TicketStatus::Completed).unwrap();
        assert!(ticket.completed_at.is_some());

        let err = transition(&mut ticket, TicketStatus::Cancelled).unwrap_err();
        assert!(matches!(
            err,
            QueueError::InvalidStatusTransition { from: TicketStatus::Completed, to: TicketStatus::Cancelled }
        ));
    }

    #[tokio::test]
    async fn finished_calls_leave_the_call_list() {
        let coordinator = QueueCoordinator::new(5, 10);
        let doctor = Uuid::new_v4();
        let first = coordinator.join(doctor, Uuid::new_v4()).await.unwrap().ticket;
        let second = coordinator.join(doctor, Uuid::new_v4()).await.unwrap().ticket;
        coordinator.call_next(doctor).await.unwrap();
        coordinator.call_next(doctor).await.unwrap();

        coordinator.complete(second.id).await.unwrap();
        assert_eq!(coordinator.lock(doctor).await.called_order, vec![first.id]);
        assert_eq!(coordinator.current(doctor).await.map(|t| t.id), Some(first.id));

        coordinator.cancel(first.id).await.unwrap();
        assert!(coordinator.lock(doctor).await.called_order.is_empty());
        assert!(coordinator.current(doctor).await.is_none());
    }
}
