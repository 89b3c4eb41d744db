pub mod elevenlabs;
pub mod openai;
pub mod pexels;
pub mod youtube;
