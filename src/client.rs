//! Vida de un cliente: entra, deja su pedido, espera barbero, recibe cada
//! servicio sentado donde le indican y se va.

use std::sync::Arc;

use tracing::{debug, info};

use crate::board::{Role, Snapshot};
use crate::error::{Result, ShopError};
use crate::line::{ClientLine, Notice};
use crate::queue::ServiceRequest;
use crate::service::{Service, ServiceSet, Station};
use crate::shop::BarberShop;
use crate::{BarberId, ClientId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClientState {
    SubmittingRequest,
    WaitingForBarber,
    WaitingForService,
    InService(Station),
    Leaving,
    Done,
}

impl ClientState {
    pub fn label(self) -> &'static str {
        match self {
            ClientState::SubmittingRequest => "ENTERING ",
            ClientState::WaitingForBarber => "W BARBER ",
            ClientState::WaitingForService => "W SERVICE",
            ClientState::InService(Station::Chair) => "IN CHAIR ",
            ClientState::InService(Station::Basin) => "IN BASIN ",
            ClientState::Leaving => "LEAVING  ",
            ClientState::Done => "DONE     ",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientReport {
    pub id: ClientId,
    pub requested: ServiceSet,
    /// En el orden en que se completaron
    pub fulfilled: Vec<Service>,
    pub barber: Option<BarberId>,
    pub rejected: bool,
}

impl ClientReport {
    /// Cada servicio pedido se hizo exactamente una vez.
    pub fn is_complete(&self) -> bool {
        !self.rejected
            && self.fulfilled.len() == self.requested.len()
            && ServiceSet::of(&self.fulfilled) == self.requested
    }
}

pub struct Client {
    id: ClientId,
    shop: Arc<BarberShop>,
    state: ClientState,
    requested: ServiceSet,
    pending: ServiceSet,
    fulfilled: Vec<Service>,
    barber: Option<BarberId>,
    position: Option<usize>,
}

impl Client {
    pub fn new(id: ClientId, requested: ServiceSet, shop: Arc<BarberShop>) -> Self {
        assert!(id > 0, "id de cliente inválido: {id}");
        assert!(!requested.is_empty(), "el cliente {id} no pidió nada");
        Client {
            id,
            shop,
            state: ClientState::SubmittingRequest,
            requested,
            pending: requested,
            fulfilled: Vec::new(),
            barber: None,
            position: None,
        }
    }

    pub fn run(mut self) -> Result<ClientReport> {
        let shop = Arc::clone(&self.shop);
        let line = shop.line().open(self.id);
        self.set_state(ClientState::SubmittingRequest);

        match shop.floor().enqueue(ServiceRequest { client: self.id, services: self.requested }) {
            Ok(()) => {}
            Err(ShopError::Closed) => {
                info!(client = self.id, "encontró la barbería cerrada");
                shop.line().close(self.id);
                self.set_state(ClientState::Done);
                return Ok(self.report(true));
            }
            Err(e) => return Err(e),
        }

        self.set_state(ClientState::WaitingForBarber);
        match line.receive()? {
            Notice::Greeted { barber } => self.barber = Some(barber),
            other => panic!("el cliente {} esperaba un saludo y recibió {:?}", self.id, other),
        }
        self.log();

        while !self.pending.is_empty() {
            self.receive_service(&line)?;
        }

        match line.receive()? {
            Notice::AllDone => {}
            other => panic!("el cliente {} esperaba el fin y recibió {:?}", self.id, other),
        }
        self.set_state(ClientState::Leaving);
        shop.line().close(self.id);
        self.set_state(ClientState::Done);
        info!(client = self.id, barber = ?self.barber, services = %self.requested, "cliente se va");
        Ok(self.report(false))
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            role: Role::Client,
            id: self.id,
            state: self.state.label(),
            counterpart: self.barber,
            tools: Default::default(),
            services: self.pending,
            position: self.position,
        }
    }

    fn receive_service(&mut self, line: &ClientLine<'_>) -> Result<()> {
        self.set_state(ClientState::WaitingForService);
        let message = match line.receive()? {
            Notice::Assigned(message) => message,
            other => panic!("el cliente {} esperaba un servicio y recibió {:?}", self.id, other),
        };
        assert_eq!(message.client, self.id, "servicio asignado al cliente equivocado");
        assert_eq!(Some(message.barber), self.barber, "servicio de un barbero que no es el suyo");
        assert!(
            self.pending.contains(message.service),
            "el cliente {} recibió {} sin pedirlo o por segunda vez",
            self.id,
            message.service
        );

        let shop = Arc::clone(&self.shop);
        let record = shop.stations(message.station).slot(message.position);
        record.sit(self.id);
        self.position = Some(message.position);
        self.set_state(ClientState::InService(message.station));
        line.acknowledge();

        match line.receive()? {
            Notice::Finished(service) if service == message.service => {}
            other => panic!("el cliente {} esperaba fin de {} y recibió {:?}", self.id, message.service, other),
        }
        record.rise(self.id);
        self.position = None;
        self.pending.remove(message.service);
        self.fulfilled.push(message.service);
        debug!(client = self.id, service = %message.service, "servicio terminado");
        line.acknowledge();
        self.log();
        Ok(())
    }

    fn report(&self, rejected: bool) -> ClientReport {
        ClientReport {
            id: self.id,
            requested: self.requested,
            fulfilled: self.fulfilled.clone(),
            barber: self.barber,
            rejected,
        }
    }

    fn set_state(&mut self, state: ClientState) {
        self.state = state;
        debug!(client = self.id, state = ?state, "transición");
        self.log();
    }

    fn log(&self) {
        self.shop.report(&self.snapshot());
    }
}
