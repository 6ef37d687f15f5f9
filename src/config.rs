//! Parámetros de la simulación. Se fijan al arrancar y no cambian más.

use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShopError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShopConfig {
    pub barbers: usize,
    pub clients: usize,

    pub barber_bench_seats: usize,
    pub client_bench_seats: usize,
    pub chairs: usize,
    pub basins: usize,

    pub scissors: usize,
    pub combs: usize,
    pub razors: usize,

    /// Tiempo de cada paso de un servicio (ms)
    pub min_work_ms: u64,
    pub max_work_ms: u64,

    /// Demora antes de cada reporte de estado (ms)
    pub min_vitality_ms: u64,
    pub max_vitality_ms: u64,

    /// Demora antes de que un cliente entre a la barbería (ms)
    pub min_arrival_ms: u64,
    pub max_arrival_ms: u64,
}

impl Default for ShopConfig {
    fn default() -> Self {
        ShopConfig {
            barbers: 2,
            clients: 6,
            barber_bench_seats: 2,
            client_bench_seats: 4,
            chairs: 2,
            basins: 1,
            scissors: 1,
            combs: 1,
            razors: 1,
            min_work_ms: 5,
            max_work_ms: 20,
            min_vitality_ms: 0,
            max_vitality_ms: 5,
            min_arrival_ms: 0,
            max_arrival_ms: 200,
        }
    }
}

impl ShopConfig {
    /// Configuración sin demoras: útil para tests.
    pub fn instant() -> Self {
        ShopConfig {
            min_work_ms: 0,
            max_work_ms: 0,
            min_vitality_ms: 0,
            max_vitality_ms: 0,
            min_arrival_ms: 0,
            max_arrival_ms: 0,
            ..ShopConfig::default()
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.barbers == 0 {
            return Err(ShopError::Config("se necesita al menos un barbero".into()));
        }
        let capacities = [
            ("barberBenchSeats", self.barber_bench_seats),
            ("clientBenchSeats", self.client_bench_seats),
            ("chairs", self.chairs),
            ("basins", self.basins),
            ("scissors", self.scissors),
            ("combs", self.combs),
            ("razors", self.razors),
        ];
        if let Some((name, _)) = capacities.iter().find(|(_, n)| *n == 0) {
            return Err(ShopError::Config(format!("{name} debe ser mayor a 0")));
        }
        // cada barbero tiene que poder sentarse siempre en el banco
        if self.barber_bench_seats < self.barbers {
            return Err(ShopError::Config(format!(
                "el banco de barberos ({}) no alcanza para {} barberos",
                self.barber_bench_seats, self.barbers
            )));
        }
        let ranges = [
            ("work", self.min_work_ms, self.max_work_ms),
            ("vitality", self.min_vitality_ms, self.max_vitality_ms),
            ("arrival", self.min_arrival_ms, self.max_arrival_ms),
        ];
        for (name, min, max) in ranges {
            if min > max {
                return Err(ShopError::Config(format!("rango {name} invertido: {min} > {max}")));
            }
        }
        Ok(())
    }

    pub fn work_time(&self) -> RangeInclusive<u64> {
        self.min_work_ms..=self.max_work_ms
    }

    pub fn vitality_time(&self) -> RangeInclusive<u64> {
        self.min_vitality_ms..=self.max_vitality_ms
    }

    pub fn arrival_time(&self) -> RangeInclusive<u64> {
        self.min_arrival_ms..=self.max_arrival_ms
    }
}

/// Duerme un tiempo al azar dentro del rango (en ms). Un rango nulo no duerme.
pub fn spend(range: RangeInclusive<u64>) {
    use rand::{thread_rng, Rng};

    let millis = thread_rng().gen_range(range);
    if millis > 0 {
        std::thread::sleep(Duration::from_millis(millis));
    }
}
