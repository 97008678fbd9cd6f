//! Short-name → glyph table for emoji rendered as images on the source site.

use std::collections::HashMap;
use std::sync::LazyLock;

static EMOJI_MAP: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        // Faces
        ("grinning_face", "😀"),
        ("smiley", "😃"),
        ("grin", "😁"),
        ("joy", "😂"),
        ("rofl", "🤣"),
        ("smile", "😊"),
        ("blush", "😊"),
        ("wink", "😉"),
        ("heart_eyes", "😍"),
        ("thinking", "🤔"),
        ("neutral_face", "😐"),
        ("expressionless", "😑"),
        ("unamused", "😒"),
        ("roll_eyes", "🙄"),
        ("grimacing", "😬"),
        ("relieved", "😌"),
        ("pensive", "😔"),
        ("sleeping", "😴"),
        ("mask", "😷"),
        ("exploding_head", "🤯"),
        ("partying_face", "🥳"),
        ("sunglasses", "😎"),
        ("nerd_face", "🤓"),
        ("confused", "😕"),
        ("worried", "😟"),
        ("open_mouth", "😮"),
        ("astonished", "😲"),
        ("flushed", "😳"),
        ("pleading_face", "🥺"),
        ("cry", "😢"),
        ("sob", "😭"),
        ("scream", "😱"),
        ("angry", "😠"),
        ("rage", "😡"),
        ("skull", "💀"),
        ("clown_face", "🤡"),
        ("ghost", "👻"),
        ("alien", "👽"),
        ("robot", "🤖"),
        // Gestures
        ("thumbsup", "👍"),
        ("thumbsdown", "👎"),
        ("+1", "👍"),
        ("-1", "👎"),
        ("ok_hand", "👌"),
        ("v", "✌️"),
        ("crossed_fingers", "🤞"),
        ("metal", "🤘"),
        ("point_right", "👉"),
        ("point_up", "👆"),
        ("wave", "👋"),
        ("clap", "👏"),
        ("raised_hands", "🙌"),
        ("handshake", "🤝"),
        ("pray", "🙏"),
        ("muscle", "💪"),
        // Hearts
        ("heart", "❤️"),
        ("orange_heart", "🧡"),
        ("yellow_heart", "💛"),
        ("green_heart", "💚"),
        ("blue_heart", "💙"),
        ("purple_heart", "💜"),
        ("black_heart", "🖤"),
        ("broken_heart", "💔"),
        ("sparkling_heart", "💖"),
        ("two_hearts", "💕"),
        // Symbols
        ("fire", "🔥"),
        ("star", "⭐"),
        ("star2", "🌟"),
        ("sparkles", "✨"),
        ("zap", "⚡"),
        ("check", "✅"),
        ("white_check_mark", "✅"),
        ("x", "❌"),
        ("warning", "⚠️"),
        ("question", "❓"),
        ("exclamation", "❗"),
        ("no_entry", "⛔"),
        ("rocket", "🚀"),
        ("bulb", "💡"),
        ("book", "📖"),
        ("bookmark", "🔖"),
        ("100", "💯"),
        ("boom", "💥"),
        ("speech_balloon", "💬"),
        ("thought_balloon", "💭"),
        ("zzz", "💤"),
        ("eyes", "👀"),
        ("brain", "🧠"),
        ("tada", "🎉"),
        ("gift", "🎁"),
        ("trophy", "🏆"),
        ("first_place_medal", "🥇"),
        ("computer", "💻"),
        ("keyboard", "⌨️"),
        ("phone", "📱"),
        ("email", "📧"),
        ("memo", "📝"),
        ("lock", "🔒"),
        ("unlock", "🔓"),
        ("key", "🔑"),
        ("gear", "⚙️"),
        ("hammer", "🔨"),
        ("coffee", "☕"),
        ("tea", "🍵"),
        ("beer", "🍺"),
        ("pizza", "🍕"),
        ("cake", "🍰"),
        ("dog", "🐕"),
        ("cat", "🐱"),
        ("fox", "🦊"),
        ("panda", "🐼"),
        ("penguin", "🐧"),
        ("owl", "🦉"),
        ("sun", "☀️"),
        ("cloud", "☁️"),
        ("rainbow", "🌈"),
        ("snowflake", "❄️"),
        ("clock", "🕐"),
        ("hourglass", "⌛"),
        ("stopwatch", "⏱️"),
    ])
});

/// Look up the literal glyph for an emoji short name.
pub fn glyph(name: &str) -> Option<&'static str> {
    EMOJI_MAP.get(name).copied()
}
