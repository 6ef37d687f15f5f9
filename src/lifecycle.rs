//! Apertura y cierre de la barbería.
//!
//! El flag de abierto y el banco de clientes comparten un mismo lock: así un
//! barbero que espera clientes ve el cierre y la cola en el mismo instante.
//! Cerrar despierta a todos los que esperan; cerrar sin avisar deja barberos
//! dormidos para siempre.
//!
//! Los barberos se van recién cuando la barbería está cerrada, el banco de
//! clientes vacío y nadie está siendo atendido.

use std::sync::{Condvar, Mutex};

use tracing::info;

use crate::error::{Result, ShopError};
use crate::queue::{ClientQueue, ServiceRequest};

struct Floor {
    open: bool,
    queue: ClientQueue,
    arrivals: usize,
    admitted: usize,
    // clientes entregados a un barbero que todavía no se fueron
    in_service: usize,
}

impl Floor {
    fn quiescent(&self) -> bool {
        !self.open && self.queue.is_empty() && self.in_service == 0
    }
}

pub struct ShopLifecycle {
    floor: Mutex<Floor>,
    // para barberos: hay pedidos o se cerró
    requests: Condvar,
    // para clientes: se liberó un lugar en el banco o se cerró
    seats: Condvar,
    // para quien maneja la simulación: llegó alguien
    arrived: Condvar,
}

impl ShopLifecycle {
    pub fn new(client_bench_seats: usize) -> Self {
        ShopLifecycle {
            floor: Mutex::new(Floor {
                open: true,
                queue: ClientQueue::new(client_bench_seats),
                arrivals: 0,
                admitted: 0,
                in_service: 0,
            }),
            requests: Condvar::new(),
            seats: Condvar::new(),
            arrived: Condvar::new(),
        }
    }

    /// Deja un pedido en el banco de clientes. Si está lleno espera un lugar;
    /// si la barbería cierra (antes o durante la espera) el pedido se rechaza.
    pub fn enqueue(&self, request: ServiceRequest) -> Result<()> {
        let mut floor = self
            .seats
            .wait_while(self.floor.lock().unwrap(), |floor| floor.open && floor.queue.is_full())
            .unwrap();

        // se revisa acá y no en `push`: el pánico no puede envenenar el lock
        if floor.queue.contains(request.client) {
            drop(floor);
            panic!("el cliente {} ya está en el banco", request.client);
        }

        floor.arrivals += 1;
        let outcome = if floor.open {
            floor.queue.push(request);
            floor.admitted += 1;
            self.requests.notify_one();
            Ok(())
        } else {
            Err(ShopError::Closed)
        };
        drop(floor);
        self.arrived.notify_all();
        outcome
    }

    /// Próximo cliente en orden de llegada. Espera mientras el banco esté
    /// vacío y todavía pueda aparecer trabajo; `None` cuando ya no puede.
    /// Los pedidos que esperaban antes del cierre se siguen entregando.
    /// Cada cliente entregado se devuelve con `client_released`.
    pub fn next_client(&self) -> Option<ServiceRequest> {
        let mut floor = self
            .requests
            .wait_while(self.floor.lock().unwrap(), |floor| {
                floor.queue.is_empty() && !floor.quiescent()
            })
            .unwrap();

        let request = floor.queue.pop();
        if request.is_some() {
            floor.in_service += 1;
        }
        drop(floor);
        if request.is_some() {
            self.seats.notify_one();
        }
        request
    }

    /// El barbero terminó con un cliente que le dio `next_client`.
    pub fn client_released(&self) {
        let mut floor = self.floor.lock().unwrap();
        if floor.in_service == 0 {
            drop(floor);
            panic!("se despidió un cliente que nadie estaba atendiendo");
        }
        floor.in_service -= 1;
        let quiescent = floor.quiescent();
        drop(floor);
        if quiescent {
            self.requests.notify_all();
        }
    }

    /// Cerrada, sin nadie esperando ni siendo atendido: no hay más trabajo posible.
    pub fn no_more_clients(&self) -> bool {
        self.floor.lock().unwrap().quiescent()
    }

    pub fn in_service(&self) -> usize {
        self.floor.lock().unwrap().in_service
    }

    pub fn close(&self) {
        let mut floor = self.floor.lock().unwrap();
        if !floor.open {
            return;
        }
        floor.open = false;
        info!(waiting = floor.queue.len(), admitted = floor.admitted, "barbería cerrada");
        drop(floor);

        self.requests.notify_all();
        self.seats.notify_all();
    }

    pub fn is_open(&self) -> bool {
        self.floor.lock().unwrap().open
    }

    pub fn pending(&self) -> usize {
        self.floor.lock().unwrap().queue.len()
    }

    pub fn admitted(&self) -> usize {
        self.floor.lock().unwrap().admitted
    }

    /// Espera a que `expected` clientes hayan intentado entrar (admitidos o rechazados).
    pub fn wait_for_arrivals(&self, expected: usize) -> usize {
        let floor = self
            .arrived
            .wait_while(self.floor.lock().unwrap(), |floor| floor.arrivals < expected)
            .unwrap();
        floor.arrivals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{Service, ServiceSet};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn request(client: usize) -> ServiceRequest {
        ServiceRequest { client, services: ServiceSet::of(&[Service::Wash]) }
    }

    #[test]
    fn closing_wakes_every_waiting_barber() {
        let shop = Arc::new(ShopLifecycle::new(2));
        let barbers: Vec<_> = (0..3)
            .map(|_| {
                let shop = shop.clone();
                thread::spawn(move || shop.next_client())
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        shop.close();
        for barber in barbers {
            assert_eq!(barber.join().unwrap(), None);
        }
        assert!(shop.no_more_clients());
    }

    #[test]
    fn closing_keeps_the_waiting_clients() {
        let shop = ShopLifecycle::new(3);
        for client in 1..=3 {
            shop.enqueue(request(client)).unwrap();
        }
        shop.close();

        assert!(!shop.no_more_clients());
        let served: Vec<_> = std::iter::from_fn(|| {
            let request = shop.next_client()?;
            shop.client_released();
            Some(request.client)
        })
        .collect();
        assert_eq!(served, vec![1, 2, 3]);
        assert!(shop.no_more_clients());
    }

    #[test]
    fn requests_after_closing_are_rejected() {
        let shop = ShopLifecycle::new(1);
        shop.close();
        assert!(matches!(shop.enqueue(request(1)), Err(ShopError::Closed)));
        assert_eq!(shop.admitted(), 0);
        assert_eq!(shop.wait_for_arrivals(1), 1);
    }

    #[test]
    fn full_bench_makes_the_client_wait() {
        let shop = Arc::new(ShopLifecycle::new(1));
        shop.enqueue(request(1)).unwrap();

        let second = {
            let shop = shop.clone();
            thread::spawn(move || shop.enqueue(request(2)))
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!second.is_finished());
        assert_eq!(shop.pending(), 1);

        assert_eq!(shop.next_client().map(|r| r.client), Some(1));
        second.join().unwrap().unwrap();
        assert_eq!(shop.next_client().map(|r| r.client), Some(2));
    }

    #[test]
    fn closing_rejects_clients_waiting_for_a_seat() {
        let shop = Arc::new(ShopLifecycle::new(1));
        shop.enqueue(request(1)).unwrap();

        let late = {
            let shop = shop.clone();
            thread::spawn(move || shop.enqueue(request(2)))
        };
        thread::sleep(Duration::from_millis(50));
        shop.close();

        assert!(matches!(late.join().unwrap(), Err(ShopError::Closed)));
        assert_eq!(shop.next_client().map(|r| r.client), Some(1));
        shop.client_released();
        assert_eq!(shop.next_client(), None);
    }

    #[test]
    fn idle_barbers_wait_for_the_ones_still_working() {
        let shop = Arc::new(ShopLifecycle::new(2));
        shop.enqueue(request(1)).unwrap();
        assert!(shop.next_client().is_some());
        shop.close();
        assert_eq!(shop.in_service(), 1);

        let idle = {
            let shop = shop.clone();
            thread::spawn(move || shop.next_client())
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!idle.is_finished());
        assert!(!shop.no_more_clients());

        shop.client_released();
        assert_eq!(idle.join().unwrap(), None);
        assert!(shop.no_more_clients());
    }

    #[test]
    fn duplicate_request_is_fatal_but_leaves_the_bench_usable() {
        let shop = ShopLifecycle::new(3);
        shop.enqueue(request(1)).unwrap();

        let duplicate = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| shop.enqueue(request(1))));
        assert!(duplicate.is_err());

        assert_eq!(shop.pending(), 1);
        assert_eq!(shop.wait_for_arrivals(1), 1);
        shop.enqueue(request(2)).unwrap();
        assert_eq!(shop.next_client().map(|r| r.client), Some(1));
    }

    #[test]
    fn a_blocked_barber_gets_the_next_request() {
        let shop = Arc::new(ShopLifecycle::new(2));
        let barber = {
            let shop = shop.clone();
            thread::spawn(move || shop.next_client())
        };
        thread::sleep(Duration::from_millis(20));
        shop.enqueue(request(7)).unwrap();
        assert_eq!(barber.join().unwrap().map(|r| r.client), Some(7));
        assert!(shop.is_open());
    }
}
