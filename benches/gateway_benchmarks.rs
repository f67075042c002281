// ABOUTME: Benchmarks for the hot paths of the gateway
// ABOUTME: Measures text segmentation, submit_sm encoding, deliver_sm parsing and receipt parsing

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use smpp_gateway::Encodable;
use smpp_gateway::codec::Frame;
use smpp_gateway::datatypes::*;
use smpp_gateway::gateway::segment;
use smpp_gateway::receipt::ReceiptBody;
use std::io::Cursor;
use std::time::Duration;

const RECEIPT: &str = "id:0123456789abcdef sub:001 dlvrd:001 submit date:2405011200 done date:240501120130 stat:DELIVRD err:000 text:Hello World";

fn text(length: usize) -> String {
    (0..length)
        .map(|n| char::from(b'a' + (n % 26) as u8))
        .collect()
}

fn create_sample_submit_sm(text: &str) -> SubmitSm {
    SubmitSm::new("40404", "27820000001")
        .source_addr_ton(TypeOfNumber::International)
        .source_addr_npi(NumericPlanIndicator::Isdn)
        .registered_delivery(RegisteredDelivery::receipt(true))
        .user_data_octets(text.as_bytes().to_vec())
        .with_tlv(Tlv::from_u8(tags::MORE_MESSAGES_TO_SEND, 1))
        .with_tlv(Tlv::from_u16(tags::SAR_MSG_REF_NUM, 0x1234))
        .with_tlv(Tlv::from_u8(tags::SAR_SEGMENT_SEQNUM, 1))
        .with_tlv(Tlv::from_u8(tags::SAR_TOTAL_SEGMENTS, 3))
}

fn create_sample_receipt() -> DeliverSm {
    let mut pdu = DeliverSm::new(7, "27820000001", "40404");
    pdu.esm_class = EsmClass::delivery_receipt();
    pdu.set_user_data(RECEIPT.as_bytes().to_vec());
    pdu
}

fn bench_segmentation(c: &mut Criterion) {
    let mut group = c.benchmark_group("segmentation");
    group.measurement_time(Duration::from_secs(5));

    for length in [160, 300, 1400, 14_000] {
        let text = text(length);
        group.bench_with_input(BenchmarkId::from_parameter(length), &text, |b, text| {
            b.iter(|| segment::split(black_box(text)))
        });
    }

    let accented = "ü".repeat(1400);
    group.bench_function("multibyte_1400", |b| {
        b.iter(|| segment::split(black_box(&accented)))
    });

    group.finish();
}

fn bench_submit_sm_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_sm_encoding");

    let segment = create_sample_submit_sm(&text(140));
    group.bench_function("sar_segment", |b| {
        b.iter(|| black_box(&segment).to_bytes())
    });

    let payload = create_sample_submit_sm(&text(600));
    group.bench_function("message_payload", |b| {
        b.iter(|| black_box(&payload).to_bytes())
    });

    group.finish();
}

fn bench_inbound(c: &mut Criterion) {
    let mut group = c.benchmark_group("inbound");

    let bytes = create_sample_receipt().to_bytes().unwrap_or_default();
    group.bench_function("deliver_sm_parse", |b| {
        b.iter(|| {
            let mut cursor = Cursor::new(black_box(bytes.as_ref()));
            Frame::parse(&mut cursor)
        })
    });

    group.bench_function("receipt_body", |b| {
        b.iter(|| black_box(RECEIPT).parse::<ReceiptBody>())
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_segmentation,
    bench_submit_sm_encoding,
    bench_inbound
);
criterion_main!(benches);
