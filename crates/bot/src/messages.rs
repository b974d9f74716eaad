//! Fixed user-facing texts.

/// Sent as soon as a question arrives, before retrieval starts.
pub const ACK_NOTICE: &str =
    "Looking into your question and going through the papers, this will take a moment.";

/// Sent when anything other than the model call fails.
pub const GENERIC_FAILURE_NOTICE: &str = "Something went wrong, please try again.";

/// Sent when the model call fails or times out.
pub const MODEL_FAILURE_NOTICE: &str =
    "The language model could not answer right now, please try again later.";

/// Reply to `/start` and `/help`.
pub const GREETING: &str = "👋 Hi! I am a guide to the author's papers. Ask me anything about \
them, or press the button below to learn more about me.";

pub const ABOUT_BUTTON_LABEL: &str = "About the author";

/// Callback data carried by the about button.
pub const ABOUT_AUTHOR_CALLBACK: &str = "about_author";

/// Written over the greeting when the about button is pressed.
pub const ABOUT_AUTHOR: &str = "This bot was built as part of a machine learning course. The \
author is a student who writes research papers and wants others to understand the material \
better and faster!";
