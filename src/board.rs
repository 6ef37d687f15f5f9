//! Tablero de estado: recibe una foto de cada agente después de sus
//! transiciones. Solo sirve para mirar; ninguna sincronización depende de él.

use std::collections::BTreeMap;
use std::sync::Mutex;

use tracing::debug;

use crate::service::{ServiceSet, ToolSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Barber,
    Client,
}

/// Foto de solo lectura de un agente.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    pub role: Role,
    pub id: usize,
    /// Etiqueta fija de 9 caracteres
    pub state: &'static str,
    pub counterpart: Option<usize>,
    pub tools: ToolSet,
    pub services: ServiceSet,
    pub position: Option<usize>,
}

pub trait StatusBoard: Send + Sync {
    fn report(&self, snapshot: &Snapshot);
}

/// Descarta todo.
pub struct NoBoard;

impl StatusBoard for NoBoard {
    fn report(&self, _snapshot: &Snapshot) {}
}

/// Cada foto como un evento de `tracing`.
pub struct LogBoard;

impl StatusBoard for LogBoard {
    fn report(&self, snapshot: &Snapshot) {
        debug!(
            role = ?snapshot.role,
            id = snapshot.id,
            state = snapshot.state.trim_end(),
            counterpart = ?snapshot.counterpart,
            tools = %snapshot.tools,
            services = %snapshot.services,
            position = ?snapshot.position,
            "estado"
        );
    }
}

/// Guarda todas las fotos en orden de llegada.
#[derive(Default)]
pub struct HistoryBoard {
    snapshots: Mutex<Vec<Snapshot>>,
}

impl HistoryBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.snapshots.lock().unwrap().clone()
    }

    /// Estados por los que pasó un agente, sin repeticiones consecutivas.
    pub fn states_of(&self, role: Role, id: usize) -> Vec<&'static str> {
        let mut states: Vec<&'static str> = self
            .snapshots
            .lock()
            .unwrap()
            .iter()
            .filter(|snapshot| snapshot.role == role && snapshot.id == id)
            .map(|snapshot| snapshot.state)
            .collect();
        states.dedup();
        states
    }
}

impl StatusBoard for HistoryBoard {
    fn report(&self, snapshot: &Snapshot) {
        self.snapshots.lock().unwrap().push(snapshot.clone());
    }
}

const BARBER_SKEL: &str = "@---+---+---@\n\
                           |B##|C##|###|\n\
                           +---+---+-+-+\n\
                           |#########|#|\n\
                           @---------+-@";

const CLIENT_SKEL: &str = "@---+---+---@\n\
                           |C##|B##|###|\n\
                           +---+---+-+-+\n\
                           |#########|#|\n\
                           @---------+-@";

/// Una caja de texto por agente, con la última foto de cada uno.
#[derive(Default)]
pub struct TextBoard {
    boxes: Mutex<BTreeMap<(Role, usize), String>>,
}

impl TextBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Todas las cajas una al lado de la otra (barberos primero).
    pub fn render(&self) -> String {
        let boxes = self.boxes.lock().unwrap();
        let lines = BARBER_SKEL.lines().count();
        (0..lines)
            .map(|row| {
                boxes
                    .values()
                    .filter_map(|text| text.lines().nth(row))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl StatusBoard for TextBoard {
    fn report(&self, snapshot: &Snapshot) {
        let text = render_box(snapshot);
        self.boxes.lock().unwrap().insert((snapshot.role, snapshot.id), text);
    }
}

/// Llena cada tira de '#' de la plantilla con el siguiente campo
/// (recortado o completado con espacios al largo de la tira).
pub fn render_box(snapshot: &Snapshot) -> String {
    let id = |value: Option<usize>| value.map_or_else(|| "--".to_string(), |v| format!("{v:02}"));
    let position = snapshot.position.map_or_else(|| "-".to_string(), |p| (p + 1).to_string());
    let (skel, middle) = match snapshot.role {
        Role::Barber => (BARBER_SKEL, snapshot.tools.to_string()),
        Role::Client => (CLIENT_SKEL, snapshot.services.to_string()),
    };
    let fields = [id(Some(snapshot.id)), id(snapshot.counterpart), middle, snapshot.state.to_string(), position];
    fill(skel, &fields)
}

fn fill(skel: &str, fields: &[String]) -> String {
    let mut out = String::with_capacity(skel.len());
    let mut fields = fields.iter();
    let mut chars = skel.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '#' {
            out.push(c);
            continue;
        }
        let mut width = 1;
        while chars.next_if_eq(&'#').is_some() {
            width += 1;
        }
        let value = fields.next().map(String::as_str).unwrap_or("");
        out.extend(value.chars().chain(std::iter::repeat(' ')).take(width));
    }
    out
}
