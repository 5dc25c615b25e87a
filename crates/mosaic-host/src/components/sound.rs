use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use mosaic_core::{
    Asset, Component, ContentConsumer, ContentSource, CoreError, CoreResult, Entity, EntityId,
    Node,
};

/// State of a clip that has been started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    /// Started and audible.
    Playing,
    /// Started, then paused.
    Paused,
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Play,
    Pause,
    Stop,
}

#[derive(Debug, Default)]
struct Mixer {
    /// Clip files in declaration order, with their asset once loaded.
    clips: Vec<(String, Option<Asset>)>,
    playing: HashMap<String, Playback>,
}

impl Mixer {
    fn knows(&self, file: &str) -> bool {
        self.clips.iter().any(|(f, _)| f == file)
    }

    fn apply(&mut self, action: Action, file: &str) {
        match action {
            Action::Play => {
                if let Some(state) = self.playing.get_mut(file) {
                    *state = Playback::Playing;
                } else if self.knows(file) {
                    self.playing.insert(file.to_string(), Playback::Playing);
                } else {
                    log::debug!("sound: no clip {file}");
                }
            }
            Action::Pause => {
                if let Some(state) = self.playing.get_mut(file) {
                    *state = Playback::Paused;
                }
            }
            Action::Stop => {
                self.playing.remove(file);
            }
        }
    }
}

/// Plays sound clips in response to entity events.
///
/// Every child of the definition node with a `file` attribute declares a
/// clip. Its own children bind entity events to actions:
///
/// ```xml
/// <component type="Sound">
///   <bark file="bark.wav">
///     <on event="Bark" action="play"/>
///     <on event="Hush" action="stop"/>
///   </bark>
/// </component>
/// ```
pub struct Sound {
    name: String,
    owner: EntityId,
    mixer: Rc<RefCell<Mixer>>,
}

impl Sound {
    /// Factory name.
    pub const TYPE_NAME: &'static str = "Sound";

    /// A sound with no clips.
    pub fn new(entity: &mut Entity, name: &str) -> Self {
        Self {
            name: name.to_string(),
            owner: entity.id(),
            mixer: Rc::default(),
        }
    }

    /// Start or resume `file`.
    pub fn play(&self, file: &str) {
        self.mixer.borrow_mut().apply(Action::Play, file);
    }

    /// Pause `file` if it is playing.
    pub fn pause(&self, file: &str) {
        self.mixer.borrow_mut().apply(Action::Pause, file);
    }

    /// Stop `file` and rewind it.
    pub fn stop(&self, file: &str) {
        self.mixer.borrow_mut().apply(Action::Stop, file);
    }

    /// `None` if the clip is not started.
    pub fn state(&self, file: &str) -> Option<Playback> {
        self.mixer.borrow().playing.get(file).copied()
    }

    /// Clip files in definition order.
    pub fn files(&self) -> Vec<String> {
        self.mixer.borrow().clips.iter().map(|(f, _)| f.clone()).collect()
    }

    /// Whether `file` was found when content loaded.
    pub fn is_loaded(&self, file: &str) -> bool {
        self.mixer
            .borrow()
            .clips
            .iter()
            .any(|(f, asset)| f == file && asset.is_some())
    }

    fn error(&self, reason: String) -> CoreError {
        CoreError::ComponentParse {
            component: self.name.clone(),
            reason,
        }
    }
}

impl ContentConsumer for Sound {
    fn load(&mut self, content: &mut dyn ContentSource) {
        for (file, asset) in &mut self.mixer.borrow_mut().clips {
            *asset = content.load(file);
            if asset.is_none() {
                log::warn!("{}: sound {file:?} could not be loaded", self.name);
            }
        }
    }
}

impl Component for Sound {
    fn name(&self) -> &str {
        &self.name
    }

    fn owner(&self) -> EntityId {
        self.owner
    }

    fn parse(&mut self, node: &Node, entity: &mut Entity) -> CoreResult<()> {
        for clip in node.children() {
            let Some(file) = clip.attr("file") else {
                continue;
            };
            if !self.mixer.borrow().knows(file) {
                self.mixer.borrow_mut().clips.push((file.to_string(), None));
            }
            for binding in clip.children() {
                let action = match binding.attr("action").map(str::to_ascii_lowercase).as_deref() {
                    Some("play") => Action::Play,
                    Some("pause") => Action::Pause,
                    Some("stop") => Action::Stop,
                    Some(other) => return Err(self.error(format!("{file}: unknown action {other:?}"))),
                    None => return Err(self.error(format!("{file}: binding without action"))),
                };
                let Some(event) = binding.attr("event") else {
                    return Err(self.error(format!("{file}: binding without event")));
                };
                let mixer = Rc::clone(&self.mixer);
                let file = file.to_string();
                entity.add_event(event, move |_: &dyn Any| mixer.borrow_mut().apply(action, &file));
            }
        }
        Ok(())
    }

    fn as_content(&mut self) -> Option<&mut dyn ContentConsumer> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::AssetDirectory;

    fn dog() -> Node {
        Node::new("component")
            .with_attr("type", "Sound")
            .with_child(
                Node::new("bark")
                    .with_attr("file", "a.wav")
                    .with_child(Node::new("on").with_attr("event", "Bark").with_attr("action", "Play"))
                    .with_child(Node::new("on").with_attr("event", "Sit").with_attr("action", "pause"))
                    .with_child(Node::new("on").with_attr("event", "Hush").with_attr("action", "stop")),
            )
            .with_child(
                Node::new("bark")
                    .with_attr("file", "b.wav")
                    .with_child(Node::new("on").with_attr("event", "Bark").with_attr("action", "play")),
            )
            .with_child(Node::new("volume").with_text("0.5"))
    }

    fn sound() -> (Entity, Sound) {
        let mut entity = Entity::new("Dog");
        let mut sound = Sound::new(&mut entity, "Sound");
        sound.parse(&dog(), &mut entity).unwrap();
        (entity, sound)
    }

    #[test]
    fn parse_declares_clips() {
        let (entity, sound) = sound();
        assert_eq!(sound.files(), vec!["a.wav", "b.wav"]);
        assert_eq!(entity.events().names(), vec!["Bark", "Hush", "Sit"]);
    }

    #[test]
    fn events_drive_playback() {
        let (entity, sound) = sound();
        entity.invoke_event("Bark", &());
        assert_eq!(sound.state("a.wav"), Some(Playback::Playing));
        assert_eq!(sound.state("b.wav"), Some(Playback::Playing));

        entity.invoke_event("Sit", &());
        assert_eq!(sound.state("a.wav"), Some(Playback::Paused));
        entity.invoke_event("Bark", &());
        assert_eq!(sound.state("a.wav"), Some(Playback::Playing));

        entity.invoke_event("Hush", &());
        assert_eq!(sound.state("a.wav"), None);
        assert_eq!(sound.state("b.wav"), Some(Playback::Playing));
    }

    #[test]
    fn unknown_clip_is_ignored() {
        let (_entity, sound) = sound();
        sound.play("meow.wav");
        assert_eq!(sound.state("meow.wav"), None);
        sound.pause("a.wav");
        assert_eq!(sound.state("a.wav"), None);
    }

    #[test]
    fn load_resolves_every_clip() {
        let (_entity, mut sound) = sound();
        let mut assets = AssetDirectory::virtual_assets();
        sound.load(&mut assets);
        assert!(sound.is_loaded("a.wav"));
        assert!(sound.is_loaded("b.wav"));
        assert_eq!(assets.requested(), ["a.wav", "b.wav"]);
    }

    #[test]
    fn bad_binding_is_a_parse_error() {
        let mut entity = Entity::new("Dog");
        let mut sound = Sound::new(&mut entity, "Sound");
        let node = Node::new("component").with_child(
            Node::new("bark")
                .with_attr("file", "a.wav")
                .with_child(Node::new("on").with_attr("event", "Bark").with_attr("action", "rewind")),
        );
        let err = sound.parse(&node, &mut entity).unwrap_err();
        assert!(err.to_string().contains("rewind"), "{err}");
    }
}
