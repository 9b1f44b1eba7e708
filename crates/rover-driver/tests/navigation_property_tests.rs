//! 导航状态机的属性测试
//!
//! 使用 proptest 对所有传感器取值验证状态转移表。

use proptest::prelude::*;
use rover_driver::{CLEARANCE_THRESHOLD, NavState, NavigationEngine, transition};
use rover_protocol::{
    FORWARD_45CM, Frame, HALF_FORWARD, SensorFrame, TURN_LEFT_90, TURN_RIGHT_90,
};

fn sensor(front: u8, side_front: u8, side_back: u8) -> SensorFrame {
    SensorFrame::try_from(Frame::new([0x01, front, side_front, side_back, 0x00, 0x00])).unwrap()
}

fn nav_state() -> impl Strategy<Value = NavState> {
    prop_oneof![
        Just(NavState::Stopped),
        Just(NavState::Forward),
        Just(NavState::AgainstObstacle),
        Just(NavState::OnCorner),
    ]
}

proptest! {
    /// Stopped 对任意传感器数据都发出半速前进并进入 Forward
    #[test]
    fn stopped_always_starts_forward(f in any::<u8>(), sf in any::<u8>(), sb in any::<u8>(), lm in any::<bool>()) {
        let t = transition(NavState::Stopped, lm, Some(&sensor(f, sf, sb)));
        prop_assert_eq!(t.command, Some(HALF_FORWARD));
        prop_assert_eq!(t.next, NavState::Forward);
        prop_assert_eq!(t.little_more, lm);
    }

    /// AgainstObstacle 对任意传感器数据都回到 Forward
    #[test]
    fn against_obstacle_always_resumes(f in any::<u8>(), sf in any::<u8>(), sb in any::<u8>(), lm in any::<bool>()) {
        let t = transition(NavState::AgainstObstacle, lm, Some(&sensor(f, sf, sb)));
        prop_assert_eq!(t.command, Some(HALF_FORWARD));
        prop_assert_eq!(t.next, NavState::Forward);
    }

    /// Forward 的完整转移表
    #[test]
    fn forward_table(f in any::<u8>(), sf in any::<u8>(), sb in any::<u8>(), lm in any::<bool>()) {
        let t = transition(NavState::Forward, lm, Some(&sensor(f, sf, sb)));
        let clear = sf >= CLEARANCE_THRESHOLD && sb >= CLEARANCE_THRESHOLD;

        if clear && lm {
            prop_assert_eq!(t.command, Some(TURN_RIGHT_90));
            prop_assert_eq!(t.next, NavState::OnCorner);
            prop_assert!(!t.little_more);
        } else if clear {
            prop_assert_eq!(t.command, Some(FORWARD_45CM));
            prop_assert_eq!(t.next, NavState::Forward);
            prop_assert!(t.little_more);
        } else if f <= CLEARANCE_THRESHOLD {
            prop_assert_eq!(t.command, Some(TURN_LEFT_90));
            prop_assert_eq!(t.next, NavState::AgainstObstacle);
            prop_assert_eq!(t.little_more, lm);
        } else {
            prop_assert_eq!(t.command, None);
            prop_assert_eq!(t.next, NavState::Forward);
            prop_assert_eq!(t.little_more, lm);
        }
    }

    /// OnCorner 的完整转移表
    #[test]
    fn on_corner_table(f in any::<u8>(), sf in any::<u8>(), sb in any::<u8>(), lm in any::<bool>()) {
        let t = transition(NavState::OnCorner, lm, Some(&sensor(f, sf, sb)));
        if sf <= CLEARANCE_THRESHOLD && sb <= CLEARANCE_THRESHOLD {
            prop_assert_eq!(t.command, Some(HALF_FORWARD));
            prop_assert_eq!(t.next, NavState::Forward);
        } else {
            prop_assert_eq!(t.command, Some(FORWARD_45CM));
            prop_assert_eq!(t.next, NavState::OnCorner);
        }
        prop_assert_eq!(t.little_more, lm);
    }

    /// 引擎返回的指令总是某个预定义运动常量，保持转移不会改变持有的指令
    #[test]
    fn engine_only_emits_canonical_moves(readings in prop::collection::vec(any::<(u8, u8, u8)>(), 1..40)) {
        let canonical = [HALF_FORWARD, FORWARD_45CM, TURN_LEFT_90, TURN_RIGHT_90];
        let mut nav = NavigationEngine::new();
        for (f, sf, sb) in readings {
            let before = nav.held_command();
            let state = nav.state();
            let little_more = nav.little_more();
            nav.receive_sensor_frame(sensor(f, sf, sb));
            let command = nav.next_move();
            prop_assert!(canonical.contains(&command));
            if transition(state, little_more, Some(&sensor(f, sf, sb))).command.is_none() {
                prop_assert_eq!(command, before);
            }
        }
    }

    /// 转移只依赖状态，任何状态都是合法起点
    #[test]
    fn transition_is_total(state in nav_state(), lm in any::<bool>(), f in any::<u8>(), sf in any::<u8>(), sb in any::<u8>()) {
        let t = transition(state, lm, Some(&sensor(f, sf, sb)));
        prop_assert!(t.command.is_some() || t.next == state);
    }
}

#[test]
fn forward_corner_example() {
    let mut nav = NavigationEngine::new();
    nav.receive_sensor_frame(sensor(0xFF, 0x5A, 0x5A));
    assert_eq!(nav.next_move(), HALF_FORWARD);

    assert_eq!(nav.next_move(), FORWARD_45CM);
    assert!(nav.little_more());
    assert_eq!(nav.state(), NavState::Forward);

    assert_eq!(nav.next_move(), TURN_RIGHT_90);
    assert!(!nav.little_more());
    assert_eq!(nav.state(), NavState::OnCorner);
}
