//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 模拟 e2e 测试（无需摄像头）
//! - 分段完整性检查：无重复、无缺口、每段恰好一个结束标记

#[cfg(test)]
mod contract_tests {
    use contracts::{MotionConfig, Packet};

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
        assert!(Packet::sentinel().is_sentinel());
        assert_eq!(MotionConfig::default().hold_secs(), 10);
    }
}

#[cfg(test)]
mod engine_tests {
    use std::sync::{Arc, Mutex};
    use std::thread;
    use std::time::{Duration, Instant};

    use contracts::{ContractError, MotionConfig, Packet, PacketFlags, PacketSink};
    use motion_engine::{MotionHandler, RecordingState};

    #[derive(Clone, Default)]
    struct CaptureSink(Arc<Mutex<Vec<Packet>>>);

    impl PacketSink for CaptureSink {
        fn name(&self) -> &str {
            "capture"
        }

        fn send(&mut self, packet: &Packet) -> Result<(), ContractError> {
            self.0.lock().unwrap().push(packet.clone());
            Ok(())
        }
    }

    impl CaptureSink {
        /// Split the captured stream at sentinels; the trailing run is returned separately
        fn segments(&self) -> (Vec<Vec<u64>>, Vec<u64>) {
            let mut closed = Vec::new();
            let mut open = Vec::new();
            for packet in self.0.lock().unwrap().iter() {
                if packet.is_sentinel() {
                    closed.push(std::mem::take(&mut open));
                } else {
                    open.push(packet.seq);
                }
            }
            (closed, open)
        }
    }

    fn config() -> MotionConfig {
        MotionConfig {
            prerecord_secs: 2,
            postrecord_secs: 4,
            analysis_window: 1,
            threshold_percent: 50,
        }
    }

    /// One packet per second of stream time, `pts == seq`
    fn packet(seq: u64, motion: bool) -> Packet {
        Packet {
            seq,
            pts: seq as i64,
            ts_monotonic: seq,
            flags: if motion {
                PacketFlags::KEYFRAME | PacketFlags::MOTION
            } else {
                PacketFlags::KEYFRAME
            },
            size: 4,
            ..Default::default()
        }
    }

    fn push_and_wait(handler: &MotionHandler, packet: Packet) {
        let seq = packet.seq;
        handler.input_port().push(packet);
        let deadline = Instant::now() + Duration::from_secs(2);
        while handler.status().analysis_cursor != Some(seq) {
            assert!(Instant::now() < deadline, "engine never analyzed seq {seq}");
            thread::sleep(Duration::from_millis(1));
        }
    }

    fn run(motion_at: &[u64], last: u64) -> (CaptureSink, motion_engine::HandlerStatus) {
        let sink = CaptureSink::default();
        let handler = MotionHandler::spawn("e2e", config(), Box::new(sink.clone())).unwrap();
        for seq in 1..=last {
            push_and_wait(&handler, packet(seq, motion_at.contains(&seq)));
        }
        let status = handler.destroy().unwrap();
        (sink, status)
    }

    #[test]
    fn test_two_separate_events_make_two_segments() {
        let (sink, status) = run(&[10, 30], 40);
        let (closed, open) = sink.segments();

        assert_eq!(closed, vec![(8..=12).collect::<Vec<_>>(), (28..=32).collect()]);
        assert!(open.is_empty());
        assert_eq!(status.engine.segments_started, 2);
        assert_eq!(status.engine.segments_closed, 2);
        assert_eq!(status.state, RecordingState::Idle);
        assert_eq!(status.engine.defects, 0);
    }

    #[test]
    fn test_resume_within_buffer_continues_segment() {
        let (sink, status) = run(&[10, 14], 25);
        let (closed, _) = sink.segments();

        // paused at 13, resumed at 14 from the packet after 12
        assert_eq!(closed, vec![(8..=16).collect::<Vec<_>>()]);
        assert_eq!(status.engine.segments_started, 1);
    }

    #[test]
    fn test_destroy_closes_open_segment() {
        let (sink, status) = run(&[10], 11);
        let (closed, open) = sink.segments();

        assert_eq!(closed, vec![vec![8, 9, 10, 11]]);
        assert!(open.is_empty());
        assert_eq!(status.engine.segments_closed, 1);
    }

    #[test]
    fn test_late_flag_does_not_trigger() {
        let sink = CaptureSink::default();
        let handler = MotionHandler::spawn("e2e", config(), Box::new(sink.clone())).unwrap();
        for seq in 1..=6 {
            push_and_wait(&handler, packet(seq, false));
        }

        // late flag for an analyzed packet only updates the stored bits
        handler.flag_port().push(Packet::motion_flag(6, true));
        push_and_wait(&handler, packet(7, false));
        let status = handler.destroy().unwrap();

        assert_eq!(status.ports.flags_merged, 1);
        assert_eq!(status.engine.segments_started, 0);
        assert!(sink.0.lock().unwrap().is_empty());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use contracts::{PacketSource, RecordedSegment, SinkConfig, SinkType};
    use dispatcher::{
        create_dispatcher, ChannelSink, DispatcherBuilder, DispatcherConfig, SegmentAssembler,
        SinkHandle,
    };
    use ingestion::{CameraConfig, MockCameraSource};
    use motion_engine::MotionHandler;
    use tokio::sync::mpsc;

    const CONFIG: &str = r#"
[stream]
name = "yard"
fps = 10.0
flag_delay_ms = 1

[motion]
prerecord_secs = 2
postrecord_secs = 4
analysis_window = 1000000
threshold_percent = 50

[[sinks]]
name = "log"
sink_type = "log"
queue_capacity = 16

[simulation]
duration_secs = 40
motion = [{ from_secs = 5.0, to_secs = 8.0 }, { from_secs = 25.0, to_secs = 28.0 }]
"#;

    fn assert_well_formed(segments: &[RecordedSegment]) {
        let mut previous_last = 0;
        for (i, segment) in segments.iter().enumerate() {
            assert_eq!(segment.index, i as u64);
            assert!(!segment.packets.is_empty());
            assert!(segment.packets.iter().all(|p| !p.is_sentinel()));
            // no gaps inside a segment
            assert!(segment.packets.windows(2).all(|w| w[1].seq == w[0].seq + 1));
            // forwarded at most once
            let first = segment.first_seq().unwrap();
            assert!(first > previous_last, "segment {i} overlaps the previous one");
            previous_last = segment.last_seq().unwrap();
        }
    }

    /// End-to-end test: MockCameraSource -> MotionHandler -> SegmentAssembler -> Dispatcher
    ///
    /// 验证完整的数据流：
    /// 1. 模拟摄像头按计划生成带运动标记的数据包
    /// 2. MotionHandler 根据滑动窗口开始/暂停/停止录制
    /// 3. Dispatcher 将 RecordedSegment 分发到 sinks
    #[tokio::test]
    async fn test_e2e_simulated_pipeline() {
        let blueprint = config_loader::ConfigLoader::load_from_str(
            CONFIG,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();

        let (segment_tx, segment_rx) = mpsc::channel(16);
        let (capture, mut capture_rx) = ChannelSink::new("capture");
        let dispatcher = DispatcherBuilder::new(
            DispatcherConfig {
                sinks: blueprint.sinks.clone(),
            },
            segment_rx,
        )
        .with_handle(SinkHandle::spawn(capture, 16))
        .build()
        .unwrap();
        let dispatcher_handle = dispatcher.spawn();

        let assembler = SegmentAssembler::new("assembler", &blueprint.stream.name, segment_tx);
        let handler =
            MotionHandler::spawn(&blueprint.stream.name, blueprint.motion.clone(), Box::new(assembler))
                .unwrap();

        let camera_config = CameraConfig::from_blueprint(&blueprint).with_speed(100.0);
        let (camera, detector) = MockCameraSource::with_detector(camera_config).unwrap();
        detector.listen(handler.flag_port().callback());
        camera.listen(handler.input_port().callback());

        let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
        while !camera.is_finished() {
            assert!(tokio::time::Instant::now() < deadline, "camera never finished");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        camera.stop();
        tokio::time::sleep(Duration::from_millis(20)).await;
        detector.stop();

        let status = handler.destroy().unwrap();
        let report = tokio::time::timeout(Duration::from_secs(5), dispatcher_handle)
            .await
            .expect("dispatcher timed out")
            .unwrap();

        let mut segments = Vec::new();
        while let Some(segment) = capture_rx.recv().await {
            segments.push(segment);
        }

        assert_eq!(camera.frames_emitted(), 400);
        assert_eq!(status.ports.raw_received, 400);
        assert_eq!(segments.len(), 2, "one segment per motion span");
        assert_well_formed(&segments);

        // frames at t=5.0..8.0 and t=25.0..28.0
        assert!(segments[0].first_seq().unwrap() <= 51);
        assert!(segments[0].last_seq().unwrap() >= 80);
        assert!(segments[1].first_seq().unwrap() <= 251);
        assert!(segments[1].last_seq().unwrap() >= 280);
        assert!(segments.iter().all(|s| s.stream == "yard"));

        let forwarded: u64 = segments.iter().map(|s| s.packets.len() as u64).sum();
        assert_eq!(forwarded, status.engine.packets_forwarded);
        assert_eq!(report.segments, 2);
        assert_eq!(report.summary.total_packets, forwarded);
        assert_eq!(report.sinks.len(), 2);
        assert!(report.sinks.iter().all(|(_, m)| m.write_count == 2));
    }

    /// Test dispatcher with multiple sink types
    #[tokio::test]
    async fn test_dispatcher_multiple_sinks() {
        let (tx, rx) = mpsc::channel::<RecordedSegment>(10);

        let sink_configs = vec![
            SinkConfig {
                name: "log1".to_string(),
                sink_type: SinkType::Log,
                queue_capacity: 50,
                params: HashMap::new(),
            },
            SinkConfig {
                name: "log2".to_string(),
                sink_type: SinkType::Log,
                queue_capacity: 50,
                params: HashMap::new(),
            },
        ];

        let dispatcher = create_dispatcher(sink_configs, rx).unwrap();
        assert_eq!(dispatcher.metrics().len(), 2);
        let handle = dispatcher.spawn();

        for i in 0..5 {
            let segment = RecordedSegment {
                index: i,
                stream: "cam".to_string(),
                packets: vec![contracts::Packet {
                    seq: i + 1,
                    ..Default::default()
                }],
            };
            tx.send(segment).await.unwrap();
        }
        drop(tx);

        let report = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.segments, 5);
        assert!(report.sinks.iter().all(|(_, m)| m.write_count == 5));
    }
}
