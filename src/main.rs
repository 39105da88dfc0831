//! Battle Bubbles headless driver
//!
//! Builds a small board, runs a scripted round and logs what happened.
//! Usage: `battle-bubbles [tuning.json]` (set `RUST_LOG=debug` for collision events)

use glam::Vec2;

use battle_bubbles::sim::{
    Aabb, BlockKind, Board, Form, FormListener, FrameInput, Obstruction, Player, Session, SlotFlags,
};
use battle_bubbles::{PhysicsError, Tuning};

/// Frames per second of the pretend display
const FRAME_DT: f32 = 1.0 / 60.0;
/// Seconds of scripted play
const DEMO_SECONDS: f32 = 4.0;

/// Logs every completed form change
struct FormLogger;

impl FormListener for FormLogger {
    fn form_changed(&mut self, player: &Player) {
        log::info!("Player {} is now {:?}", player.id, player.form());
    }
}

/// Two rows of hex slots across the middle of the board
fn build_board(tuning: &Tuning) -> Result<Board, PhysicsError> {
    let mut board = Board::new(Aabb::new(Vec2::ZERO, Vec2::new(800.0, 600.0)));
    board.add_obstruction(Obstruction::rectangle(Aabb::new(
        Vec2::new(380.0, 80.0),
        Vec2::new(420.0, 160.0),
    )));
    board.add_obstruction(Obstruction::circle(Vec2::new(400.0, 480.0), 30.0).with_friction(0.6));
    board.add_obstruction(Obstruction::lattice());

    let slot_radius = 26.0;
    let dx = slot_radius * 3.0_f32.sqrt();
    let mut rows: Vec<Vec<usize>> = Vec::new();
    for row in 0..2 {
        let y = 280.0 + row as f32 * slot_radius * 1.5;
        let offset = if row % 2 == 0 { 0.0 } else { dx * 0.5 };
        let flags = SlotFlags {
            solid_collision: false,
            bubble_collision: false,
            pops_bubble: row == 1,
            special: false,
        };
        let ids = (0..6)
            .map(|col| {
                let center = Vec2::new(250.0 + offset + col as f32 * dx, y);
                board.add_slot(center, slot_radius, flags)
            })
            .collect();
        rows.push(ids);
    }
    for row in &rows {
        for pair in row.windows(2) {
            board.connect(pair[0], pair[1])?;
        }
    }
    for col in 0..6 {
        board.connect(rows[0][col], rows[1][col])?;
        if col + 1 < 6 {
            board.connect(rows[0][col + 1], rows[1][col])?;
        }
    }
    board.fill_slot(rows[0][5], Some(3), tuning.block_radius)?;

    for i in 0..5 {
        let pos = Vec2::new(200.0 + i as f32 * 90.0, 200.0);
        board.spawn_block(BlockKind::Standard, pos, tuning.block_radius);
    }
    board.spawn_block(BlockKind::PowerUp, Vec2::new(600.0, 420.0), tuning.block_radius);
    board.ambient_force = Vec2::new(0.0, 5.0);
    Ok(board)
}

/// Scripted input: everyone heads for the middle, player 0 grabs and drops a block
fn script(t: f32) -> FrameInput {
    let mut input = FrameInput::default();
    let toward_middle = [
        Vec2::new(1.0, 0.6),
        Vec2::new(-1.0, 0.6),
        Vec2::new(1.0, -0.6),
        Vec2::new(-1.0, -0.6),
    ];
    for (player_input, dir) in input.players.iter_mut().zip(toward_middle) {
        player_input.movement = if t < 1.5 { dir.normalize() } else { Vec2::ZERO };
    }
    if (1.0..1.0 + FRAME_DT).contains(&t) {
        input.players[0].form = Some(Form::Solid);
        input.players[1].form = Some(Form::Solid);
    }
    if (2.5..2.5 + FRAME_DT).contains(&t) {
        input.players[0].form = Some(Form::Bubble);
    }
    input.players[3].defend = t > 2.0;
    input
}

fn run(tuning: Tuning) -> Result<(), PhysicsError> {
    let board = build_board(&tuning)?;
    let spawns = [
        Vec2::new(120.0, 100.0),
        Vec2::new(680.0, 100.0),
        Vec2::new(120.0, 500.0),
        Vec2::new(680.0, 500.0),
    ];
    let mut session = Session::new(board, spawns, tuning)?;
    session.add_listener(Box::new(FormLogger));

    let frames = (DEMO_SECONDS / FRAME_DT) as u32;
    for frame in 0..frames {
        let t = frame as f32 * FRAME_DT;
        session.advance(FRAME_DT, &script(t))?;

        if frame % 60 == 0 {
            for player in &session.players {
                let bubble = &player.bubble;
                log::info!(
                    "t={:.2}s player {} {:?} center=({:.1}, {:.1}) orientation={:.3}",
                    t,
                    player.id,
                    player.form(),
                    bubble.center_position().x,
                    bubble.center_position().y,
                    bubble.orientation()
                );
            }
        }
    }

    for player in &session.players {
        println!(
            "player {}: form={:?} payload={:?} stats={:?}",
            player.id,
            player.form(),
            player.payload.as_ref().map(|b| b.id),
            player.stats
        );
    }
    let owned = session.board.slots.iter().filter(|s| s.owner.is_some()).count();
    println!(
        "ticks={} loose blocks={} owned slots={}",
        session.time_ticks,
        session.board.blocks.len(),
        owned
    );
    Ok(())
}

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();
    log::info!("Battle Bubbles (headless) starting...");

    let tuning = match std::env::args().nth(1) {
        Some(path) => Tuning::load(&path),
        None => Ok(Tuning::default()),
    };
    let result = tuning.and_then(run);
    if let Err(e) = result {
        log::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
