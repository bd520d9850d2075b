// The `unused_crate_dependencies` lint checks every crate in a package separately.
// See <https://github.com/rust-lang/rust/issues/57274>.
#![allow(unused_crate_dependencies)]

use features::Feature;
use log::Level;

#[test]
fn toggled_features_log_with_prefix() {
    testing_logger::setup();

    features::log!(DebugFinalization, "not logged while disabled");

    Feature::DebugFinalization.enable();
    features::log!(DebugFinalization, "finalizing block {}", 7);
    if Feature::DebugFinalization.is_enabled() {
        Feature::DebugFinalization.warn(format_args!("engine call for block {} failed", 8));
    }
    Feature::DebugFinalization.disable();

    features::log!(DebugFinalization, "not logged after disabling");

    testing_logger::validate(|logs| {
        itertools::assert_equal(
            logs.iter().map(|log| (log.level, log.body.as_str())),
            [
                (Level::Info, "[DebugFinalization] finalizing block 7"),
                (Level::Warn, "[DebugFinalization] engine call for block 8 failed"),
            ],
        );
    });
}

#[test]
fn features_parse_from_their_names() {
    assert!(matches!(
        "LogRelayDrops".parse::<Feature>(),
        Ok(Feature::LogRelayDrops),
    ));
    assert!("NoSuchFeature".parse::<Feature>().is_err());
}
