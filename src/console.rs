//! Console prompt adapter.
//!
//! Thin translation between stdin/stdout and [`Prompt`] inputs. Bad
//! numeric input falls back to the configured defaults instead of
//! re-asking (matching what the operators are used to); unrecognised
//! menu choices re-ask. EOF on stdin reads as "quit"/"done" so a closed
//! terminal still winds the program down through the normal path.

use crate::config::Config;
use crate::jog::{JogMode, JogSettings};
use crate::workflow::{GotoAction, Mode, Prompt, TeachStep};
use crate::Result;
use std::io::{self, BufRead, Write};

pub struct ConsolePrompt {
    default_increment: f64,
    default_velocity: f64,
}

impl ConsolePrompt {
    pub fn new(config: &Config) -> Self {
        Self {
            default_increment: config.default_increment,
            default_velocity: config.default_velocity,
        }
    }

    /// One trimmed line from stdin; `None` on EOF.
    fn read_line(&self, label: &str) -> Result<Option<String>> {
        print!("{label}");
        io::stdout().flush()?;
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}

impl Prompt for ConsolePrompt {
    fn choose_mode(&mut self) -> Result<Mode> {
        loop {
            println!();
            println!("Select mode:");
            println!("  [m] manual move");
            println!("  [t] teach");
            println!("  [g] goto");
            println!("  [q] quit");
            let Some(answer) = self.read_line("> ")? else {
                return Ok(Mode::Quit);
            };
            match answer.to_lowercase().as_str() {
                "m" | "move" | "manual" => return Ok(Mode::Manual),
                "t" | "teach" => return Ok(Mode::Teach),
                "g" | "goto" => return Ok(Mode::Goto),
                "q" | "quit" => return Ok(Mode::Quit),
                other => println!("unrecognised choice {other:?}"),
            }
        }
    }

    fn jog_settings(&mut self) -> Result<JogSettings> {
        let mode = loop {
            let Some(answer) = self.read_line("control mode [step/velocity] (velocity): ")? else {
                break JogMode::Velocity;
            };
            match answer.to_lowercase().as_str() {
                "" | "v" | "velocity" => break JogMode::Velocity,
                "s" | "step" => break JogMode::Step,
                other => println!("unrecognised mode {other:?}"),
            }
        };
        let increment = self
            .read_line(&format!("step increment mm ({}): ", self.default_increment))?
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.default_increment);
        let velocity = self
            .read_line(&format!("velocity mm/s ({}): ", self.default_velocity))?
            .and_then(|s| s.parse().ok())
            .unwrap_or(self.default_velocity);
        println!("starting control loop; press the stop button on the pad when done");
        Ok(JogSettings {
            mode,
            increment,
            velocity,
        })
    }

    fn sequence_name(&mut self) -> Result<String> {
        loop {
            let Some(name) = self.read_line("sequence name: ")? else {
                return Ok(String::from("unnamed"));
            };
            if !name.is_empty() {
                return Ok(name);
            }
            println!("please enter a name");
        }
    }

    fn add_or_done(&mut self) -> Result<TeachStep> {
        loop {
            let Some(answer) = self.read_line("[a]dd another position or [d]one: ")? else {
                return Ok(TeachStep::Done);
            };
            match answer.to_lowercase().as_str() {
                "a" | "add" => return Ok(TeachStep::Add),
                "d" | "done" => return Ok(TeachStep::Done),
                other => println!("unrecognised choice {other:?}"),
            }
        }
    }

    fn confirm_go_home(&mut self) -> Result<bool> {
        loop {
            let Some(answer) = self.read_line("return to home position? [y/N]: ")? else {
                return Ok(false);
            };
            match answer.to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "" | "n" | "no" => return Ok(false),
                other => println!("unrecognised choice {other:?}"),
            }
        }
    }

    fn goto_action(&mut self, names: &[String]) -> Result<GotoAction> {
        println!("taught sequences:");
        for (i, name) in names.iter().enumerate() {
            println!("  [{}] {name}", i + 1);
        }
        loop {
            let Some(answer) =
                self.read_line("action [p]ickup <n> / [d]ropoff <n> / [h]ome / [q] done: ")?
            else {
                return Ok(GotoAction::Done);
            };
            let mut parts = answer.split_whitespace();
            let verb = parts.next().unwrap_or("").to_lowercase();
            let picked = parts
                .next()
                .and_then(|s| s.parse::<usize>().ok())
                .and_then(|n| names.get(n.wrapping_sub(1)))
                .cloned();
            match (verb.as_str(), picked) {
                ("p" | "pickup", Some(name)) => return Ok(GotoAction::Pickup(name)),
                ("d" | "dropoff", Some(name)) => return Ok(GotoAction::Dropoff(name)),
                ("h" | "home", _) => return Ok(GotoAction::Home),
                ("q" | "done", _) => return Ok(GotoAction::Done),
                ("p" | "pickup" | "d" | "dropoff", None) => {
                    println!("give a sequence number, e.g. \"p 1\"")
                }
                _ => println!("unrecognised action {answer:?}"),
            }
        }
    }
}
