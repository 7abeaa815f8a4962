use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::ArenaConfig;
use crate::entity::{Combatant, CombatantProfile, Projectile, ProjectileId};
use crate::error::SyncError;
use crate::event::{DespawnCause, EventQueue, MatchEvent};
use crate::net::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub winner: PlayerId,
    pub loser: PlayerId,
    pub frame_id: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub id: PlayerId,
    pub name: String,
    pub hit_points: u32,
    pub win: bool,
}

/// Authoritative state of one combatant as handed over on rejoin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantSnapshot {
    pub id: PlayerId,
    pub position: Vec2,
    pub hit_points: u32,
    pub heading: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RejoinSnapshot {
    pub combatants: Vec<CombatantSnapshot>,
}

/// Everything one match owns: roster, shots in flight and the terminal
/// outcome. Scheduler and arbiter operate on it explicitly.
#[derive(Debug, Clone)]
pub struct MatchContext {
    arena: ArenaConfig,
    combatants: Vec<Combatant>,
    projectiles: Vec<Projectile>,
    next_projectile_id: u32,
    frame_id: Option<u32>,
    outcome: Option<MatchOutcome>,
}

impl MatchContext {
    pub fn new(arena: ArenaConfig) -> Self {
        Self {
            arena,
            combatants: Vec::new(),
            projectiles: Vec::new(),
            next_projectile_id: 1,
            frame_id: None,
            outcome: None,
        }
    }

    /// Standard duel layout: first combatant on the left edge facing right,
    /// second on the right edge facing left, both vertically centered.
    pub fn two_player(
        first: (PlayerId, CombatantProfile),
        second: (PlayerId, CombatantProfile),
        arena: ArenaConfig,
    ) -> Result<Self, SyncError> {
        let mut ctx = Self::new(arena);
        let half = ctx.arena.combatant_width / 2.0;
        let y = ctx.arena.height / 2.0;

        ctx.add_combatant(first.0, Vec2::new(half, y), 0.0, first.1)?;
        let right = ctx.arena.width - half;
        ctx.add_combatant(second.0, Vec2::new(right, y), 180.0, second.1)?;
        Ok(ctx)
    }

    pub fn add_combatant(
        &mut self,
        id: PlayerId,
        position: Vec2,
        heading: f32,
        profile: CombatantProfile,
    ) -> Result<&mut Combatant, SyncError> {
        if self.index_of(&id).is_some() {
            return Err(SyncError::DuplicateCombatant { id });
        }
        let combatant = Combatant::new(id, position, heading, &self.arena).with_profile(profile);
        let idx = self.combatants.len();
        self.combatants.push(combatant);
        Ok(&mut self.combatants[idx])
    }

    pub fn arena(&self) -> &ArenaConfig {
        &self.arena
    }

    pub fn combatants(&self) -> &[Combatant] {
        &self.combatants
    }

    pub fn combatants_mut(&mut self) -> impl Iterator<Item = &mut Combatant> {
        self.combatants.iter_mut()
    }

    pub fn combatant(&self, id: &PlayerId) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.id() == id)
    }

    pub fn combatant_mut(&mut self, id: &PlayerId) -> Option<&mut Combatant> {
        self.combatants.iter_mut().find(|c| c.id() == id)
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn frame_id(&self) -> Option<u32> {
        self.frame_id
    }

    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn outcome(&self) -> Option<&MatchOutcome> {
        self.outcome.as_ref()
    }

    pub(crate) fn begin_frame(&mut self, frame_id: u32) {
        self.frame_id = Some(frame_id);
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut [Combatant], &mut Vec<Projectile>) {
        (&mut self.combatants, &mut self.projectiles)
    }

    /// Fires from the combatant's current logic heading and muzzle point.
    pub fn spawn_projectile(&mut self, source: &PlayerId) -> Result<ProjectileId, SyncError> {
        let shooter = self
            .combatant(source)
            .ok_or_else(|| SyncError::UnknownActor {
                actor: source.clone(),
            })?;
        let origin = shooter.muzzle(&self.arena);
        let heading = shooter.logic_heading();

        let id = ProjectileId(self.next_projectile_id);
        self.next_projectile_id = self.next_projectile_id.wrapping_add(1);

        self.projectiles.push(Projectile::new(
            id,
            source.clone(),
            origin,
            heading,
            self.arena.projectile_speed,
            self.arena.projectile_radius,
        ));
        Ok(id)
    }

    pub fn step_logic(&mut self, dt: f32, events: &mut EventQueue) {
        if self.is_over() {
            return;
        }

        for combatant in &mut self.combatants {
            combatant.step_logic(dt, &self.arena);
        }

        let bounds = self.arena.bounds();
        let frame_id = self.frame_id;
        self.projectiles.retain_mut(|shot| {
            shot.step_logic(dt);
            if shot.is_outside(bounds) {
                events.push(
                    frame_id,
                    MatchEvent::ProjectileDespawned {
                        projectile: shot.id(),
                        cause: DespawnCause::LeftArena,
                    },
                );
                false
            } else {
                true
            }
        });
    }

    pub fn step_prediction(&mut self, dt: f32) {
        for combatant in &mut self.combatants {
            combatant.step_prediction(dt, &self.arena);
        }
        for shot in &mut self.projectiles {
            shot.step_prediction(dt);
        }
    }

    pub fn step_render(&mut self, dt: f32) {
        if self.is_over() {
            return;
        }
        for combatant in &mut self.combatants {
            combatant.step_render(dt, &self.arena);
        }
        for shot in &mut self.projectiles {
            shot.step_render(dt, self.arena.projectile_render_rate);
        }
    }

    /// Ends the match once any combatant is out of hit points. The loser is
    /// the lowest hit points, the earliest roster entry on a tie.
    pub(crate) fn resolve_outcome(&mut self, events: &mut EventQueue) -> Option<&MatchOutcome> {
        if self.outcome.is_some() || !self.combatants.iter().any(Combatant::is_defeated) {
            return None;
        }

        let loser = self
            .combatants
            .iter()
            .enumerate()
            .min_by_key(|(idx, c)| (c.hit_points(), *idx))
            .map(|(_, c)| c.id().clone())?;
        let winner = self.leader(Some(&loser))?;

        log::info!("match over at frame {:?}: {} beat {}", self.frame_id, winner, loser);
        events.push(
            self.frame_id,
            MatchEvent::MatchOver {
                winner: winner.clone(),
                loser: loser.clone(),
            },
        );
        self.outcome = Some(MatchOutcome {
            winner,
            loser,
            frame_id: self.frame_id,
        });
        self.outcome.as_ref()
    }

    /// Highest hit points wins; ties go to the later roster entry.
    fn leader(&self, excluding: Option<&PlayerId>) -> Option<PlayerId> {
        self.combatants
            .iter()
            .enumerate()
            .filter(|(_, c)| Some(c.id()) != excluding)
            .max_by_key(|(idx, c)| (c.hit_points(), *idx))
            .map(|(_, c)| c.id().clone())
    }

    /// Marks the winner and reports every combatant's final standing. Works
    /// for a match stopped before anyone was defeated, too.
    pub fn settle(&mut self) -> Vec<MatchResult> {
        let winner = match &self.outcome {
            Some(outcome) => Some(outcome.winner.clone()),
            None => self.leader(None),
        };

        self.combatants
            .iter_mut()
            .map(|c| {
                c.profile.win = Some(c.id()) == winner.as_ref();
                MatchResult {
                    id: c.id().clone(),
                    name: c.profile.name.clone(),
                    hit_points: c.hit_points(),
                    win: c.profile.win,
                }
            })
            .collect()
    }

    pub fn snapshot(&self) -> RejoinSnapshot {
        RejoinSnapshot {
            combatants: self
                .combatants
                .iter()
                .map(|c| CombatantSnapshot {
                    id: c.id().clone(),
                    position: c.logic_position(),
                    hit_points: c.hit_points(),
                    heading: c.logic_heading(),
                })
                .collect(),
        }
    }

    /// Applies an authoritative snapshot. Unknown ids are skipped.
    pub fn restore(&mut self, snapshot: &RejoinSnapshot) {
        for entry in &snapshot.combatants {
            match self.combatant_mut(&entry.id) {
                Some(c) => c.restore(entry.position, entry.hit_points, entry.heading),
                None => log::warn!("rejoin snapshot names unknown combatant {}", entry.id),
            }
        }
    }

    fn index_of(&self, id: &PlayerId) -> Option<usize> {
        self.combatants.iter().position(|c| c.id() == id)
    }
}
