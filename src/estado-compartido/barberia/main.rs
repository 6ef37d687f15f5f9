/*
PROBLEMA: la barbería con varios barberos
- Los barberos esperan sentados en su banco; los clientes, en el suyo.
- Cada cliente pide alguna combinación de corte, afeitado y lavado.
- Corte y afeitado se hacen en una silla, el lavado en un lavatorio.
- El corte necesita tijera y peine; el afeitado, navaja. Hay pocas de cada una.
- La barbería cierra cuando llegaron todos los clientes, pero los barberos
  atienden a los que quedaron esperando antes de irse.
*/

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use barberia::{
    LogBoard, NoBoard, Scheduler, ShopConfig, Simulation, SimulationReport, StatusBoard, TextBoard,
    ThreadScheduler, TokioScheduler,
};
use clap::{Parser, ValueEnum};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Runtime {
    /// un hilo del sistema por agente
    Threads,
    /// pool de tareas bloqueantes de tokio
    Tokio,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Board {
    None,
    Log,
    Text,
}

#[derive(Parser, Debug)]
#[command(name = "barberia", about = "Barbería concurrente: barberos, clientes y recursos compartidos")]
struct Args {
    /// Configuración en JSON (los flags de abajo la pisan)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    barbers: Option<usize>,

    #[arg(long)]
    clients: Option<usize>,

    #[arg(long, value_enum, default_value = "threads")]
    runtime: Runtime,

    #[arg(long, value_enum, default_value = "none")]
    board: Board,

    /// Cada cuántos ms se pinta el tablero de texto
    #[arg(long)]
    paint_every: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ShopConfig::from_file(path)?,
        None => ShopConfig::default(),
    };
    if let Some(barbers) = args.barbers {
        config.barbers = barbers;
        // que siempre haya banco para todos
        config.barber_bench_seats = config.barber_bench_seats.max(barbers);
    }
    if let Some(clients) = args.clients {
        config.clients = clients;
    }
    config.validate()?;

    let text_board = Arc::new(TextBoard::new());
    let board: Arc<dyn StatusBoard> = match args.board {
        Board::None => Arc::new(NoBoard),
        Board::Log => Arc::new(LogBoard),
        Board::Text => text_board.clone(),
    };

    // pintor del tablero: solo lee, nunca bloquea a los agentes
    let painting = Arc::new(AtomicBool::new(true));
    let painter = match (args.board, args.paint_every) {
        (Board::Text, Some(every)) => {
            let (board, painting) = (text_board.clone(), painting.clone());
            Some(thread::spawn(move || {
                while painting.load(Ordering::SeqCst) {
                    println!("{}\n", board.render());
                    thread::sleep(Duration::from_millis(every));
                }
            }))
        }
        _ => None,
    };

    let report = match args.runtime {
        Runtime::Threads => run(config, ThreadScheduler, board)?,
        Runtime::Tokio => run(config, TokioScheduler::new()?, board)?,
    };

    painting.store(false, Ordering::SeqCst);
    if let Some(painter) = painter {
        let _ = painter.join();
    }
    if let Board::Text = args.board {
        println!("{}", text_board.render());
    }

    for barber in &report.barbers {
        println!("[Barbero {}] atendió a {:?}", barber.id, barber.served);
    }
    for client in &report.clients {
        if client.rejected {
            println!("[Cliente {}] encontró la barbería cerrada", client.id);
        } else {
            println!(
                "[Cliente {}] pidió {}, lo atendió el barbero {:?}: {:?}",
                client.id, client.requested, client.barber, client.fulfilled
            );
        }
    }
    println!("Atendidos: {} / Rechazados: {}", report.served(), report.rejected());
    Ok(())
}

fn run<S: Scheduler>(
    config: ShopConfig,
    scheduler: S,
    board: Arc<dyn StatusBoard>,
) -> barberia::Result<SimulationReport> {
    Simulation::new(config, scheduler, board).run()
}
