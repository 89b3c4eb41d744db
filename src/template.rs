use crate::logi;
use crate::script::{Scene, Script, ScriptSource, VideoRequest, VideoType};
use anyhow::Result;
use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

const TITLES: &[&str] = &[
    "{niche}: What Nobody Tells You",
    "The Truth About {niche}",
    "{niche} Explained in Minutes",
    "Why Everyone Is Talking About {niche}",
];

const INTROS: &[&str] = &[
    "Ever wondered what makes {niche} so fascinating? Let's find out.",
    "Stop scrolling, because {niche} is about to surprise you.",
    "Here is everything you need to know about {niche}.",
];

const BODIES: &[&str] = &[
    "One thing most people miss about {niche} is how much it has changed recently.",
    "Experts in {niche} agree that the basics matter more than the tricks.",
    "The history of {niche} is stranger than you might think.",
    "A simple habit can change how you approach {niche} every day.",
    "Here is a quick fact about {niche} that you can share with friends.",
    "The biggest mistake beginners make with {niche} is rushing the first steps.",
    "If you want results with {niche}, consistency beats intensity.",
    "There is a surprising link between {niche} and everyday life.",
];

const VISUALS: &[&str] = &[
    "close up of {niche}",
    "wide shot related to {niche}",
    "people enjoying {niche}",
    "abstract background {niche}",
];

const OUTROS: &[&str] = &[
    "If you learned something about {niche}, like and subscribe for more.",
    "Follow for more on {niche}, and tell us what you want to see next.",
];

/// Offline script generator that fills phrase templates with the niche.
pub struct TemplateScriptSource {
    rng: Mutex<rand::rngs::StdRng>,
}

impl TemplateScriptSource {
    pub fn new() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self::with_seed(seed)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(rand::rngs::StdRng::seed_from_u64(seed)),
        }
    }

    fn build(&self, request: &VideoRequest) -> Script {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let niche = request.niche.trim();
        let fill = |template: &str| template.replace("{niche}", niche);

        let (scene_count, duration) = match request.video_type {
            VideoType::Short => (6, 10.0),
            VideoType::Long => (11, 30.0),
        };

        let mut bodies: Vec<&str> = BODIES.to_vec();
        bodies.shuffle(&mut *rng);

        let mut scenes = Vec::with_capacity(scene_count);
        for i in 0..scene_count {
            let narration = if i == 0 {
                fill(pick(INTROS, &mut *rng))
            } else if i == scene_count - 1 {
                fill(pick(OUTROS, &mut *rng))
            } else {
                fill(bodies[(i - 1) % bodies.len()])
            };
            scenes.push(Scene {
                narration,
                visual_description: fill(pick(VISUALS, &mut *rng)),
                duration,
            });
        }

        let mut hashtags = vec![hashtag(niche)];
        hashtags.extend(request.tags().iter().map(|tag| hashtag(tag)));
        let description = format!(
            "A {} look at {}. {}",
            request.video_type,
            niche,
            hashtags.join(" ")
        );

        let mut script = Script {
            title: fill(pick(TITLES, &mut *rng)),
            description,
            script: String::new(),
            scenes,
        };
        script.script = script.full_narration();
        script
    }
}

impl Default for TemplateScriptSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScriptSource for TemplateScriptSource {
    async fn generate(&self, request: &VideoRequest) -> Result<Script> {
        let script = self.build(request);
        logi(format!(
            "Template script ready: \"{}\" ({} scenes)",
            script.title,
            script.scenes.len()
        ));
        Ok(script)
    }
}

fn pick<'a, R: Rng>(options: &[&'a str], rng: &mut R) -> &'a str {
    options.choose(rng).copied().unwrap_or_default()
}

fn hashtag(text: &str) -> String {
    let body: String = text
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars().filter(|c| c.is_alphanumeric());
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect();
    format!("#{}", body)
}
