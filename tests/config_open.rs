//! 通过配置创建过滤器

mod common;

use std::fs;

use common::{FRAME, TIME_BASE, TestStream, init_logger};
use hengsu::codec::parsers::h264::{NalFraming, ParameterSets, parse_frame_num};
use hengsu::config::AppConfig;
use hengsu::filter::drain_packets;

#[test]
fn test_配置文件加载模板并补帧() {
    init_logger();
    let stream = TestStream {
        cabac: true,
        ..TestStream::cavlc(NalFraming::LengthPrefixed(4))
    };
    let template = [0x7Bu8, 0x00, 0x9C, 0x40, 0x01];

    let dir = tempfile::tempdir().unwrap();
    let template_dir = dir.path().join("skip_slices");
    fs::create_dir(&template_dir).unwrap();
    fs::write(
        template_dir.join(format!("{}x{}.bin", stream.width(), stream.height())),
        template,
    )
    .unwrap();

    let config_path = dir.path().join("hengsu.json");
    let json = format!(
        r#"{{ "constrate": {{ "frame_rate": "25", "template_dir": "{}", "label": "cam-7" }} }}"#,
        template_dir.display().to_string().replace('\\', "\\\\")
    );
    fs::write(&config_path, json).unwrap();

    let config = AppConfig::load(&config_path).unwrap();
    let mut filter = hengsu::open_constrate(&config.constrate, &stream.codec_params(), TIME_BASE).unwrap();
    assert_eq!(filter.label(), "cam-7");
    assert_eq!(filter.duration(), FRAME);

    drain_packets(&mut filter, stream.key_packet(0)).unwrap();
    let output = drain_packets(&mut filter, stream.p_packet(1, 3 * FRAME)).unwrap();
    assert_eq!(output.len(), 3);

    let params = ParameterSets::from_extradata(&stream.codec_params().extra_data).unwrap();
    for (i, packet) in output[..2].iter().enumerate() {
        assert!(packet.data.ends_with(&template), "跳帧应以模板结尾");
        assert_eq!(parse_frame_num(&packet.data, &params).unwrap(), i as u32 + 1);
    }
    assert_eq!(parse_frame_num(&output[2].data, &params).unwrap(), 3);
}

#[test]
fn test_无模板目录时cabac被拒绝() {
    init_logger();
    let stream = TestStream {
        cabac: true,
        ..TestStream::cavlc(NalFraming::LengthPrefixed(4))
    };
    let config = AppConfig::from_json_str(r#"{ "constrate": { "frame_rate": "25/1" } }"#).unwrap();
    let err = hengsu::open_constrate(&config.constrate, &stream.codec_params(), TIME_BASE).unwrap_err();
    assert!(format!("{err:#}").contains("32x32"), "{err:#}");
}

#[test]
fn test_无效帧率配置() {
    init_logger();
    let stream = TestStream::cavlc(NalFraming::AnnexB);
    for rate in ["fast", "0/1", "25/0"] {
        let json = format!(r#"{{ "constrate": {{ "frame_rate": "{rate}" }} }}"#);
        let config = AppConfig::from_json_str(&json).unwrap();
        assert!(
            hengsu::open_constrate(&config.constrate, &stream.codec_params(), TIME_BASE).is_err(),
            "帧率 {rate} 应被拒绝"
        );
    }
}

#[test]
fn test_版本号() {
    assert!(!hengsu::version().is_empty());
}
