//! # Command processor module
//!
//! The command processor handles arm telecommands coming from any source. Each command is applied
//! to arm control and the resulting demands are forwarded to the actuator sink, one command at a
//! time.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use std::{thread, time::Duration};

// Internal
use crate::{data_store::DataStore, servo_ctrl::ActuatorSink};
use comms_if::tc::{arm_ctrl::ArmCmd, Tc, TcResponse};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Executes telecommands against the data store.
#[derive(Debug, Clone, Copy, Default)]
pub struct CmdProcessor {
    /// Time given to the actuators to settle after each step.
    pub step_delay: Duration,

    /// Time given to the actuators to settle after an emergency stop.
    pub stop_delay: Duration,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CmdProcessor {
    pub fn new(step_delay: Duration, stop_delay: Duration) -> Self {
        Self {
            step_delay,
            stop_delay,
        }
    }

    /// Parse and execute a JSON telecommand.
    pub fn exec_json(
        &self,
        ds: &mut DataStore,
        sink: &mut dyn ActuatorSink,
        json_str: &str,
    ) -> TcResponse {
        match Tc::from_json(json_str) {
            Ok(tc) => self.exec(ds, sink, &tc),
            Err(e) => {
                warn!("Rejected TC: {}", e);
                TcResponse::from(&e)
            }
        }
    }

    /// Execute a telecommand.
    ///
    /// Mutates the datastore and forwards demands to the sink. A failing sink does not undo the
    /// applied state.
    pub fn exec(&self, ds: &mut DataStore, sink: &mut dyn ActuatorSink, tc: &Tc) -> TcResponse {
        match tc {
            Tc::Arm(cmd) => self.run(ds, sink, &[*cmd]),
            Tc::Target(target) => match ds.arm_ctrl.plan_target(target) {
                Ok(plan) if plan.is_empty() => {
                    debug!("Target {:?} already reached", target);
                    TcResponse::NoMotion
                }
                Ok(plan) => self.run(ds, sink, &plan),
                Err(e) => {
                    warn!("Rejected target {:?}: {}", target, e);
                    TcResponse::Rejected(e.to_string())
                }
            },
        }
    }

    /// Apply commands in order, forwarding each command's demands before the next is applied.
    ///
    /// Stops at the first sink error. The command which failed stays applied, later commands are
    /// dropped.
    fn run(&self, ds: &mut DataStore, sink: &mut dyn ActuatorSink, cmds: &[ArmCmd]) -> TcResponse {
        let mut stopped = false;

        for (i, cmd) in cmds.iter().copied().enumerate() {
            let dems = ds.arm_ctrl.apply(cmd);
            ds.arm_ctrl_status_rpt = ds.arm_ctrl.report();
            ds.num_cmds += 1;

            if let Err(e) = sink.write_all(&dems) {
                warn!(
                    "Actuator sink error for {}, dropping {} remaining command(s): {}",
                    cmd,
                    cmds.len() - i - 1,
                    e
                );
                ds.sink_result(false);
                return TcResponse::ActuatorError(e.to_string());
            }
            ds.sink_result(true);

            if cmd == ArmCmd::EmergencyStop {
                stopped = true;
                thread::sleep(self.stop_delay);
            } else {
                thread::sleep(self.step_delay);
            }
        }

        match stopped {
            true => TcResponse::Stopped,
            false => TcResponse::Executing,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::arm_ctrl::ArmCtrl;
    use crate::servo_ctrl::{ServoError, SimServo};
    use comms_if::eqpt::mech::{ActuatorDem, JointId};
    use comms_if::tm::SystemStatus;

    /// Sink which fails every write while `fail` is set.
    #[derive(Default)]
    struct FlakySink {
        fail: bool,
        written: Vec<ActuatorDem>,
    }

    impl ActuatorSink for FlakySink {
        fn write(&mut self, dem: &ActuatorDem) -> Result<(), ServoError> {
            if self.fail {
                return Err(ServoError::I2c);
            }
            self.written.push(*dem);
            Ok(())
        }
    }

    fn setup() -> (CmdProcessor, DataStore) {
        (
            CmdProcessor::default(),
            DataStore::new(ArmCtrl::default(), 0),
        )
    }

    #[test]
    fn test_responses() {
        let (processor, mut ds) = setup();
        let mut sink = SimServo::new();

        let cases = [
            (r#"{"command": "WAIST_LEFT"}"#, "Executing"),
            (r#"{"command": "GRIPPER_TOGGLE"}"#, "Executing"),
            (r#"{"command": "EMERGENCY_STOP"}"#, "Stopped"),
            (r#"{"command": "waist_left"}"#, "Invalid command"),
            (r#"{"command": "JUMP"}"#, "Invalid command"),
            (r#"{"cmd": "WAIST_LEFT"}"#, "No command provided"),
            (r#"{"command": "WAIST_LEFT""#, "Invalid JSON"),
            (r#"{"joint": "base", "value": 90}"#, "No motion required"),
            (r#"{"joint": "shoulder", "value": 200}"#, "Angle out of range (0 to 170)"),
            (r#"{"joint": "shoulder", "value": 100}"#, "Executing"),
            (r#"{"joint": "emergency_stop", "value": null}"#, "Stopped"),
        ];

        for (json, status) in cases.iter() {
            let rsp = processor.exec_json(&mut ds, &mut sink, json);
            assert_eq!(rsp.status(), *status, "{}", json);
        }
    }

    #[test]
    fn test_demands_forwarded() {
        let (processor, mut ds) = setup();
        let mut sink = FlakySink::default();

        processor.exec(&mut ds, &mut sink, &Tc::Arm(ArmCmd::WaistLeft));
        assert_eq!(
            sink.written,
            vec![ActuatorDem {
                joint: JointId::Base,
                pos_deg: 175
            }]
        );

        sink.written.clear();
        processor.exec_json(&mut ds, &mut sink, r#"{"joint": "wrist", "value": 80}"#);
        assert_eq!(sink.written.len(), 2);
        assert_eq!(sink.written[1].pos_deg, 170);
        assert_eq!(ds.arm_ctrl.snapshot().wrist_deg, 80);
        assert_eq!(ds.num_cmds, 3);
    }

    #[test]
    fn test_invalid_commands_leave_state() {
        let (processor, mut ds) = setup();
        let mut sink = FlakySink::default();

        processor.exec_json(&mut ds, &mut sink, r#"{"command": "SHOULDER_UP"}"#);
        let before = ds.arm_ctrl.snapshot();

        for json in [r#"{"command": "JUMP"}"#, r#"{}"#, "not json"] {
            let rsp = processor.exec_json(&mut ds, &mut sink, json);
            assert!(matches!(rsp, TcResponse::Rejected(_)));
        }

        assert_eq!(ds.arm_ctrl.snapshot(), before);
        assert_eq!(sink.written.len(), 1);
    }

    #[test]
    fn test_sink_failure_keeps_state() {
        let (processor, mut ds) = setup();
        let mut sink = FlakySink {
            fail: true,
            ..Default::default()
        };

        let rsp = processor.exec(&mut ds, &mut sink, &Tc::Arm(ArmCmd::ElbowUp));
        assert_eq!(rsp, TcResponse::ActuatorError(ServoError::I2c.to_string()));
        assert_eq!(ds.arm_ctrl.snapshot().elbow_deg, 95);
        assert_eq!(ds.system_status(), SystemStatus::Error);
        assert_eq!(ds.telemetry().system_status, SystemStatus::Error);

        sink.fail = false;
        let rsp = processor.exec(&mut ds, &mut sink, &Tc::Arm(ArmCmd::ElbowUp));
        assert_eq!(rsp, TcResponse::Executing);
        assert_eq!(ds.arm_ctrl.snapshot().elbow_deg, 100);
        assert_eq!(ds.system_status(), SystemStatus::Operational);
    }

    #[test]
    fn test_stop_reaches_every_actuator() {
        let (processor, mut ds) = setup();
        let mut sink = SimServo::new();

        processor.exec_json(&mut ds, &mut sink, r#"{"joint": "base", "value": 0}"#);
        processor.exec_json(&mut ds, &mut sink, r#"{"joint": "gripper", "value": "CLOSED"}"#);
        assert_eq!(sink.position(JointId::Base), Some(90));
        assert_eq!(sink.position(JointId::Gripper), Some(0));
        assert_eq!(sink.position(JointId::Elbow), None);

        let rsp = processor.exec(&mut ds, &mut sink, &Tc::Arm(ArmCmd::EmergencyStop));
        assert_eq!(rsp, TcResponse::Stopped);
        assert_eq!(sink.position(JointId::Base), Some(180));
        assert_eq!(sink.position(JointId::Shoulder), Some(90));
        assert_eq!(sink.position(JointId::Elbow), Some(90));
        assert_eq!(sink.position(JointId::Wrist), Some(180));
        assert_eq!(sink.position(JointId::Gripper), Some(180));
    }

    #[test]
    fn test_sink_failure_stops_target() {
        let (processor, mut ds) = setup();
        let mut sink = FlakySink {
            fail: true,
            ..Default::default()
        };

        let rsp = processor.exec_json(&mut ds, &mut sink, r#"{"joint": "base", "value": -180}"#);
        assert!(matches!(rsp, TcResponse::ActuatorError(_)));

        // Only the first step of the 54 planned was applied
        assert_eq!(ds.num_cmds, 1);
        assert_eq!(ds.arm_ctrl.snapshot().base_deg, 85);
        assert_eq!(ds.num_consec_sink_errors, 1);
    }
}
