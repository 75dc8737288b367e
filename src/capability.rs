//! Optional platform capabilities: speech and sound. Both are
//! best-effort; a missing backend is silently skipped.

use std::env;
use std::io::{self, Write};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Sender};
use std::thread;

use tracing::{debug, trace, warn};

/// Speaks text aloud without blocking the caller. Utterances queue in
/// the order they are given.
pub trait Narrator {
    fn speak(&self, text: &str);
}

/// Speech programs tried in order.
const SPEECH_PROGRAMS: [&str; 3] = ["espeak-ng", "espeak", "say"];

/// Narrator backed by a command-line speech synthesiser, fed from a
/// worker thread so speech never stalls the UI.
pub struct CommandNarrator {
    program: &'static str,
    queue: Sender<String>,
}

impl CommandNarrator {
    /// Find a speech program on `PATH`; `None` if there is none.
    pub fn detect() -> Option<Self> {
        let path = env::var_os("PATH")?;
        let program = SPEECH_PROGRAMS
            .into_iter()
            .find(|name| env::split_paths(&path).any(|dir| is_executable(&dir.join(name))))?;

        let (queue, rx) = mpsc::channel::<String>();
        thread::spawn(move || {
            for text in rx {
                if let Err(e) = speak_with(program, &text) {
                    warn!(program, error = %e, "speech program failed");
                }
            }
        });

        debug!(program, "narration enabled");
        Some(Self { program, queue })
    }

    pub fn program(&self) -> &str {
        self.program
    }
}

impl Narrator for CommandNarrator {
    fn speak(&self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        // Worker gone means speech broke; nothing to do about it here
        let _ = self.queue.send(text.to_string());
    }
}

/// Run one utterance. The text goes in on stdin so nothing in it can be
/// read as an option.
fn speak_with(program: &str, text: &str) -> io::Result<ExitStatus> {
    let mut child = Command::new(program)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }
    child.wait()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Short sounds the storybook plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    PageFlip,
    Chime,
}

pub trait SoundSink {
    fn play(&self, cue: Cue);
}

/// Rings the terminal bell for the chime. Page flips have no terminal
/// equivalent and are only traced.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl SoundSink for TerminalBell {
    fn play(&self, cue: Cue) {
        trace!(?cue, "sound cue");
        if cue == Cue::Chime {
            let mut out = std::io::stdout();
            let _ = out.write_all(b"\x07").and_then(|_| out.flush());
        }
    }
}

/// Whatever speech and sound the platform offers.
pub struct Capabilities {
    pub narrator: Option<Box<dyn Narrator>>,
    pub sound: Box<dyn SoundSink>,
}

impl Capabilities {
    /// Detect what the platform offers. `narrate` false skips speech detection.
    pub fn detect(narrate: bool) -> Self {
        let narrator = if narrate {
            CommandNarrator::detect().map(|n| Box::new(n) as Box<dyn Narrator>)
        } else {
            None
        };
        if narrate && narrator.is_none() {
            debug!("no speech program found, narration disabled");
        }
        Self { narrator, sound: Box::new(TerminalBell) }
    }

    /// Speak if a narrator exists; otherwise do nothing.
    pub fn narrate(&self, text: &str) {
        if let Some(narrator) = &self.narrator {
            narrator.speak(text);
        }
    }

    pub fn play(&self, cue: Cue) {
        self.sound.play(cue);
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records everything it is asked to say or play.
    #[derive(Clone, Default)]
    pub struct Recorder {
        pub spoken: Rc<RefCell<Vec<String>>>,
        pub cues: Rc<RefCell<Vec<Cue>>>,
    }

    impl Narrator for Recorder {
        fn speak(&self, text: &str) {
            self.spoken.borrow_mut().push(text.to_string());
        }
    }

    impl SoundSink for Recorder {
        fn play(&self, cue: Cue) {
            self.cues.borrow_mut().push(cue);
        }
    }

    impl Recorder {
        /// Capabilities that report into this recorder.
        pub fn capabilities(&self, with_narrator: bool) -> Capabilities {
            Capabilities {
                narrator: with_narrator.then(|| Box::new(self.clone()) as Box<dyn Narrator>),
                sound: Box::new(self.clone()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::Recorder;
    use super::*;

    #[test]
    fn test_recorder_keeps_order() {
        let rec = Recorder::default();
        rec.speak("one");
        rec.speak("two");
        rec.play(Cue::PageFlip);
        rec.play(Cue::Chime);
        assert_eq!(*rec.spoken.borrow(), ["one", "two"]);
        assert_eq!(*rec.cues.borrow(), [Cue::PageFlip, Cue::Chime]);
    }

    #[test]
    fn test_absent_narrator_is_silent() {
        let rec = Recorder::default();
        let caps = rec.capabilities(false);
        caps.narrate("hello");
        caps.play(Cue::PageFlip);
        assert!(rec.spoken.borrow().is_empty());
        assert_eq!(rec.cues.borrow().len(), 1);
    }

    #[test]
    fn test_missing_program_is_not_executable() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(!is_executable(&dir.path().join("espeak")));
    }

    #[cfg(unix)]
    fn script(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join(name);
        std::fs::write(&path, body).expect("write script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_plain_file_is_not_executable() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tempdir");
        let plain = dir.path().join("say");
        std::fs::write(&plain, "").expect("write");
        std::fs::set_permissions(&plain, std::fs::Permissions::from_mode(0o644)).expect("chmod");
        assert!(!is_executable(&plain));
        assert!(is_executable(&script(dir.path(), "espeak", "#!/bin/sh\n")));
    }

    #[cfg(unix)]
    #[test]
    fn test_dash_text_is_spoken_not_parsed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out = dir.path().join("heard");
        let body = format!("#!/bin/sh\necho \"$#\" > '{0}.args'\ncat > '{0}'\n", out.display());
        let program = script(dir.path(), "speak", &body);

        let status = speak_with(&program.to_string_lossy(), "-w /tmp/owned.wav").expect("runs");
        assert!(status.success());
        assert_eq!(std::fs::read_to_string(&out).expect("heard"), "-w /tmp/owned.wav");
        let args = std::fs::read_to_string(dir.path().join("heard.args")).expect("args");
        assert_eq!(args.trim(), "0");
    }
}
