/// Public tag name the widget registers under.
pub const ELEMENT_NAME: &str = "game-map";

/// Smallest zoom the viewport will ever hold. Wins over `CONFIGURED_MIN_ZOOM`.
pub const ZOOM_FLOOR: f64 = 1.0;
pub const ZOOM_CEILING: f64 = 5.0;
/// Declared minimum; not enforced (see `ZOOM_FLOOR`).
pub const CONFIGURED_MIN_ZOOM: f64 = 0.1;
pub const INITIAL_ZOOM: f64 = 1.0;
/// Multiplier applied per wheel notch or zoom key press.
pub const ZOOM_STEP: f64 = 1.1;

/// Stylesheet shared by every widget instance, resolved against the document base.
pub const STYLESHEET_PATH: &str = "styles.css";

pub const ATTR_DATA_SRC: &str = "data-src";
pub const ATTR_SIZE_SYNC: &str = "size-sync";
pub const ATTR_DISABLE_ZOOM: &str = "disable-zoom";
pub const ATTR_DISABLE_PAN: &str = "disable-pan";
pub const ATTR_INITIAL_X: &str = "initial-x";
pub const ATTR_INITIAL_Y: &str = "initial-y";
pub const ATTR_INITIAL_ZOOM: &str = "initial-zoom";

pub const OBSERVED_ATTRIBUTES: &[&str] = &[
    ATTR_DATA_SRC,
    ATTR_SIZE_SYNC,
    ATTR_DISABLE_ZOOM,
    ATTR_DISABLE_PAN,
    ATTR_INITIAL_X,
    ATTR_INITIAL_Y,
    ATTR_INITIAL_ZOOM,
];
