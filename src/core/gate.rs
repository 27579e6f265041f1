//! Admission filter for chat messages
//!
//! Runs before any lookup. Every message is filtered by length and command
//! prefix; ambient chatter additionally has to win a percentage roll.

use rand::Rng;

use crate::config::Config;

/// Source of uniformly distributed integers in `1..=100`
pub trait Sampler: Send + Sync {
    fn sample(&self) -> u8;
}

/// Thread-local RNG sampler used outside of tests
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSampler;

impl Sampler for ThreadRngSampler {
    fn sample(&self) -> u8 {
        rand::thread_rng().gen_range(1..=100)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    /// A regular chat message that might happen to be a lyric
    Ambient,
    /// The user explicitly asked for a continuation
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Admit,
    TooShort,
    CommandPrefix,
    NotSampled,
}

impl GateDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, GateDecision::Admit)
    }
}

pub struct TriggerGate {
    min_length: usize,
    command_prefixes: Vec<String>,
    probability: u8,
    sampler: Box<dyn Sampler>,
}

impl TriggerGate {
    pub fn with_sampler(config: &Config, sampler: Box<dyn Sampler>) -> Self {
        Self {
            min_length: config.min_trigger_length,
            command_prefixes: config.command_prefixes.clone(),
            probability: config.trigger_probability,
            sampler,
        }
    }

    pub fn evaluate(&self, text: &str, invocation: Invocation) -> GateDecision {
        let text = text.trim();

        if text.chars().count() < self.min_length {
            return GateDecision::TooShort;
        }

        if self.is_command(text) {
            return GateDecision::CommandPrefix;
        }

        if invocation == Invocation::Command {
            return GateDecision::Admit;
        }

        // sample in 1..=100, admitted with probability `probability`%
        if self.sampler.sample() > self.probability {
            return GateDecision::NotSampled;
        }

        GateDecision::Admit
    }

    pub fn is_command(&self, text: &str) -> bool {
        let text = text.trim_start();
        self.command_prefixes.iter().any(|prefix| text.starts_with(prefix.as_str()))
    }
}
