use duel::{MatchEvent, MatchResult};

#[derive(Debug, Clone)]
pub enum SimEvent {
    Match {
        frame_id: Option<u32>,
        event: MatchEvent,
    },
    LinkDown {
        at_ms: u64,
    },
    LinkResumed {
        backlog_through: Option<u32>,
    },
    ResumeTimedOut {
        after_ms: u64,
    },
    Finished {
        results: Vec<MatchResult>,
    },
}

impl SimEvent {
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            SimEvent::LinkDown { .. }
                | SimEvent::ResumeTimedOut { .. }
                | SimEvent::Match {
                    event: MatchEvent::ReconnectAbandoned,
                    ..
                }
        )
    }

    /// Projectile traffic is too chatty for the log.
    pub fn is_noise(&self) -> bool {
        matches!(
            self,
            SimEvent::Match {
                event: MatchEvent::ProjectileSpawned { .. } | MatchEvent::ProjectileDespawned { .. },
                ..
            }
        )
    }

    pub fn describe(&self) -> String {
        match self {
            SimEvent::Match { frame_id, event } => {
                let at = frame_id.map_or_else(|| "-".to_owned(), |id| id.to_string());
                format!("[{}] {}", at, describe_match(event))
            }
            SimEvent::LinkDown { at_ms } => format!("link down at {}ms", at_ms),
            SimEvent::LinkResumed { backlog_through } => match backlog_through {
                Some(id) => format!("link back, backlog through frame {}", id),
                None => "link back, nothing missed".to_owned(),
            },
            SimEvent::ResumeTimedOut { after_ms } => {
                format!("resume abandoned after {}ms", after_ms)
            }
            SimEvent::Finished { results } => {
                let parts: Vec<String> = results
                    .iter()
                    .map(|r| {
                        format!(
                            "{} {} ({} hp)",
                            r.name,
                            if r.win { "won" } else { "lost" },
                            r.hit_points
                        )
                    })
                    .collect();
                format!("match settled: {}", parts.join(", "))
            }
        }
    }
}

fn describe_match(event: &MatchEvent) -> String {
    match event {
        MatchEvent::Countdown { seconds } => format!("countdown {}s", seconds),
        MatchEvent::ProjectileSpawned { projectile, source } => {
            format!("{} fired {}", source, projectile)
        }
        MatchEvent::ProjectileDespawned { projectile, cause } => {
            format!("{} gone ({:?})", projectile, cause)
        }
        MatchEvent::HitPointsChanged {
            combatant,
            hit_points,
        } => format!("{} hit, {} hp left", combatant, hit_points),
        MatchEvent::MatchOver { winner, loser } => format!("{} defeated {}", winner, loser),
        MatchEvent::ReconnectStarted { rejoin } => {
            if *rejoin {
                "rejoining match".to_owned()
            } else {
                "resuming after network drop".to_owned()
            }
        }
        MatchEvent::ReconnectCompleted { frame_id, executed } => {
            format!("resumed at frame {} ({} executed)", frame_id, executed)
        }
        MatchEvent::ReconnectAbandoned => "resume abandoned".to_owned(),
    }
}
