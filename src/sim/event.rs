/// Events emitted during a simulation step.
/// The presentation layer consumes these for sound; the core never
/// calls into audio or rendering directly.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    PlayerJumped,
    PlayerLanded,
    EnemyStomped { id: usize },
    PlayerDied,
    LevelCleared,
}
