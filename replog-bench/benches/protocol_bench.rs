//! Protocol encoding/decoding benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use replog_protocol::{
    decode, name_hash, Append, Command, Encode, ErrorResponse, GetSize, GetSizeResponse, IoBuffer,
    Message, MessageReader, ResendRequest,
};

fn create_get_size(name_len: usize) -> String {
    format!("/var/log/{}", "x".repeat(name_len))
}

fn create_stream(count: u32) -> Vec<u8> {
    let mut data = Vec::new();
    for id in 0..count {
        let msg = Append {
            id,
            name_hash: 0xF01518F4,
            dst_fd: 3,
            src_offset: u64::from(id) * 4096,
            chunk_size: 4096,
        }
        .encode()
        .unwrap();
        data.extend_from_slice(msg.as_bytes());
    }
    data
}

fn fixed_messages() -> Vec<(&'static str, Message)> {
    vec![
        (
            "get_size_response",
            GetSizeResponse {
                id: 1,
                name_hash: 2,
                dst_fd: 3,
                dst_size: 4,
            }
            .encode()
            .unwrap(),
        ),
        (
            "append",
            Append {
                id: 1,
                name_hash: 2,
                dst_fd: 3,
                src_offset: 4,
                chunk_size: 5,
            }
            .encode()
            .unwrap(),
        ),
        (
            "resend_request",
            ResendRequest {
                id: 1,
                name_hash: 2,
                dst_size: 3,
            }
            .encode()
            .unwrap(),
        ),
        (
            "error_response",
            ErrorResponse {
                id: 1,
                name_hash: 2,
                last_cmd: Command::Append,
                error: "no space left on device",
            }
            .encode()
            .unwrap(),
        ),
    ]
}

fn bench_get_size_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_size_encode");

    for size in [8, 64, 1024] {
        let name = create_get_size(size);
        let msg = GetSize {
            id: 1,
            name: &name,
            src_size: 1234567890,
            src_fd: 2,
            mode: 0o644,
        };

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(size), &msg, |b, msg| {
            b.iter(|| black_box(msg.encode().unwrap()));
        });
    }

    group.finish();
}

fn bench_get_size_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_size_decode");

    for size in [8, 64, 1024] {
        let name = create_get_size(size);
        let encoded = GetSize {
            id: 1,
            name: &name,
            src_size: 1234567890,
            src_fd: 2,
            mode: 0o644,
        }
        .encode()
        .unwrap();

        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &encoded, |b, encoded| {
            b.iter(|| black_box(decode(encoded.as_bytes()).unwrap()));
        });
    }

    group.finish();
}

fn bench_fixed_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("fixed_decode");

    for (name, msg) in fixed_messages() {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(name), &msg, |b, msg| {
            b.iter(|| black_box(decode(msg.as_bytes()).unwrap()));
        });
    }

    group.finish();
}

fn bench_io_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("io_buffer");
    let chunk = [0x42u8; 28];

    group.throughput(Throughput::Bytes(chunk.len() as u64 * 32));
    group.bench_function("write_read_crunch", |b| {
        let mut buffer = IoBuffer::<1024>::new();
        b.iter(|| {
            for _ in 0..32 {
                buffer.write(&chunk);
            }
            for _ in 0..32 {
                black_box(buffer.read(chunk.len()).unwrap());
            }
            buffer.crunch();
        });
    });

    group.finish();
}

fn bench_reader(c: &mut Criterion) {
    let mut group = c.benchmark_group("message_reader");

    for count in [1, 100, 1000] {
        let stream = create_stream(count);

        group.throughput(Throughput::Bytes(stream.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &stream, |b, stream| {
            b.iter(|| {
                let mut reader = MessageReader::<4096>::new();
                let mut decoded = 0;
                for chunk in stream.chunks(1500) {
                    reader.extend(chunk);
                    while let Some(view) = reader.next_message().unwrap() {
                        black_box(view);
                        decoded += 1;
                    }
                }
                black_box(decoded)
            });
        });
    }

    group.finish();
}

fn bench_name_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("name_hash");

    for size in [8, 64, 1024] {
        let data = vec![b'x'; size];

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| black_box(name_hash(data)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_get_size_encode,
    bench_get_size_decode,
    bench_fixed_decode,
    bench_io_buffer,
    bench_reader,
    bench_name_hash,
);

criterion_main!(benches);
