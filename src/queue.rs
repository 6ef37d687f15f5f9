//! Banco de clientes: pedidos en orden de llegada, con capacidad fija.
//!
//! No sincroniza nada por sí mismo; vive dentro del lock de `ShopLifecycle`
//! junto con el flag de abierto/cerrado.

use std::collections::VecDeque;

use crate::service::ServiceSet;
use crate::ClientId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServiceRequest {
    pub client: ClientId,
    pub services: ServiceSet,
}

#[derive(Debug)]
pub struct ClientQueue {
    capacity: usize,
    pending: VecDeque<ServiceRequest>,
}

impl ClientQueue {
    pub fn new(capacity: usize) -> Self {
        ClientQueue { capacity, pending: VecDeque::with_capacity(capacity) }
    }

    /// Precondiciones: hay lugar y el cliente no está ya esperando.
    pub fn push(&mut self, request: ServiceRequest) {
        assert!(!self.is_full(), "banco de clientes lleno ({})", self.capacity);
        assert!(
            !self.contains(request.client),
            "el cliente {} ya está esperando",
            request.client
        );
        self.pending.push_back(request);
    }

    pub fn pop(&mut self) -> Option<ServiceRequest> {
        self.pending.pop_front()
    }

    pub fn contains(&self, client: ClientId) -> bool {
        self.pending.iter().any(|request| request.client == client)
    }

    pub fn is_full(&self) -> bool {
        self.pending.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
