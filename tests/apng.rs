use byteorder::{BigEndian, WriteBytesExt};

use png_chunks::{
    chunk, BlendOp, ChunkKind, Decoder, DecodingError, DisposeOp, FormatErrorInner, SIGNATURE,
};

fn raw_chunk(type_: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.write_u32::<BigEndian>(data.len() as u32).unwrap();
    out.extend_from_slice(type_);
    out.extend_from_slice(data);
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(type_);
    hasher.update(data);
    out.write_u32::<BigEndian>(hasher.finalize()).unwrap();
    out
}

fn ihdr_data(width: u32, height: u32) -> Vec<u8> {
    let mut data = Vec::new();
    data.write_u32::<BigEndian>(width).unwrap();
    data.write_u32::<BigEndian>(height).unwrap();
    data.extend_from_slice(&[8, 6, 0, 0, 0]);
    data
}

fn actl_data(num_frames: u32, num_plays: u32) -> Vec<u8> {
    let mut data = Vec::new();
    data.write_u32::<BigEndian>(num_frames).unwrap();
    data.write_u32::<BigEndian>(num_plays).unwrap();
    data
}

#[allow(clippy::too_many_arguments)]
fn fctl_data(
    sequence_number: u32,
    width: u32,
    height: u32,
    x_offset: u32,
    y_offset: u32,
    delay_num: u16,
    delay_den: u16,
    dispose_op: u8,
    blend_op: u8,
) -> Vec<u8> {
    let mut data = Vec::new();
    data.write_u32::<BigEndian>(sequence_number).unwrap();
    data.write_u32::<BigEndian>(width).unwrap();
    data.write_u32::<BigEndian>(height).unwrap();
    data.write_u32::<BigEndian>(x_offset).unwrap();
    data.write_u32::<BigEndian>(y_offset).unwrap();
    data.write_u16::<BigEndian>(delay_num).unwrap();
    data.write_u16::<BigEndian>(delay_den).unwrap();
    data.push(dispose_op);
    data.push(blend_op);
    data
}

fn fdat_data(sequence_number: u32, payload: &[u8]) -> Vec<u8> {
    let mut data = Vec::new();
    data.write_u32::<BigEndian>(sequence_number).unwrap();
    data.extend_from_slice(payload);
    data
}

/// A two-frame animation: the first frame is the default image.
fn animated_png() -> Vec<u8> {
    let mut png = SIGNATURE.to_vec();
    png.extend(raw_chunk(b"IHDR", &ihdr_data(8, 8)));
    png.extend(raw_chunk(b"acTL", &actl_data(2, 0)));
    png.extend(raw_chunk(b"fcTL", &fctl_data(0, 8, 8, 0, 0, 1, 100, 0, 0)));
    png.extend(raw_chunk(b"IDAT", &[0x11; 16]));
    png.extend(raw_chunk(b"fcTL", &fctl_data(1, 4, 4, 2, 2, 1, 30, 1, 1)));
    png.extend(raw_chunk(b"fdAT", &fdat_data(2, &[0x22; 16])));
    png.extend(raw_chunk(b"IEND", &[]));
    png
}

fn decode(data: &[u8]) -> Result<Vec<png_chunks::Chunk>, DecodingError> {
    let mut reader = Decoder::new(data).read_signature()?;
    let mut chunks = Vec::new();
    while let Some(chunk) = reader.next_chunk()? {
        chunks.push(chunk);
    }
    Ok(chunks)
}

fn format_error(err: DecodingError) -> png_chunks::FormatError {
    match err {
        DecodingError::Format(err) => err,
        other => panic!("expected a format error, got {:?}", other),
    }
}

#[test]
fn classifies_animation_chunks() {
    let png = animated_png();
    let chunks = decode(&png).unwrap();

    let kinds: Vec<_> = chunks.iter().map(|c| c.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            ChunkKind::Header,
            ChunkKind::AnimationControl,
            ChunkKind::FrameControl,
            ChunkKind::ImageData,
            ChunkKind::FrameControl,
            ChunkKind::FrameData,
            ChunkKind::ImageEnd,
        ]
    );

    // The animation chunks are all ancillary, fdAT included.
    for i in [1, 2, 4, 5] {
        assert!(!chunks[i].is_critical(), "chunk {} should be ancillary", i);
    }

    let fdat = &chunks[5];
    assert_eq!(fdat.type_, chunk::fdAT);
    assert_eq!(fdat.fdat_sequence_number(), Some(2));
    assert_eq!(&fdat.data[4..], &[0x22; 16]);
}

#[test]
fn animation_metadata_lands_in_info() {
    let png = animated_png();
    let mut reader = Decoder::new(&png[..]).read_signature().unwrap();
    while reader.next_chunk().unwrap().is_some() {}

    let info = reader.info().expect("info populated").clone();
    assert!(info.is_animated());

    let actl = info.animation_control().expect("acTL seen");
    assert_eq!(actl.num_frames, 2);
    assert_eq!(actl.num_plays, 0);

    // The most recent frame control wins.
    let fctl = info.frame_control().expect("fcTL seen");
    assert_eq!(fctl.sequence_number, 1);
    assert_eq!((fctl.width, fctl.height), (4, 4));
    assert_eq!((fctl.x_offset, fctl.y_offset), (2, 2));
    assert_eq!((fctl.delay_num, fctl.delay_den), (1, 30));
    assert_eq!(fctl.dispose_op, DisposeOp::Background);
    assert_eq!(fctl.blend_op, BlendOp::Over);
}

#[test]
fn plain_png_never_produces_animation_variants() {
    let mut png = SIGNATURE.to_vec();
    png.extend(raw_chunk(b"IHDR", &ihdr_data(8, 8)));
    png.extend(raw_chunk(b"IDAT", &[0x11; 16]));
    png.extend(raw_chunk(b"IEND", &[]));

    let mut reader = Decoder::new(&png[..]).read_signature().unwrap();
    let mut chunks = Vec::new();
    while let Some(chunk) = reader.next_chunk().unwrap() {
        chunks.push(chunk);
    }

    assert!(chunks.iter().all(|c| !matches!(
        c.kind(),
        ChunkKind::AnimationControl | ChunkKind::FrameControl | ChunkKind::FrameData
    )));
    assert!(chunks.iter().all(|c| c.fdat_sequence_number().is_none()));
    assert!(!reader.info().unwrap().is_animated());
}

#[test]
fn animation_control_must_precede_image_data() {
    let mut png = SIGNATURE.to_vec();
    png.extend(raw_chunk(b"IHDR", &ihdr_data(8, 8)));
    png.extend(raw_chunk(b"IDAT", &[0x11; 16]));
    png.extend(raw_chunk(b"acTL", &actl_data(1, 0)));
    png.extend(raw_chunk(b"IEND", &[]));

    let err = format_error(decode(&png).unwrap_err());
    assert_eq!(
        *err.kind(),
        FormatErrorInner::AfterIdat { chunk: chunk::acTL }
    );
}

#[test]
fn animation_chunk_sizes_are_validated() {
    let mut png = SIGNATURE.to_vec();
    png.extend(raw_chunk(b"IHDR", &ihdr_data(8, 8)));
    png.extend(raw_chunk(b"acTL", &actl_data(1, 0)[..7]));
    png.extend(raw_chunk(b"IEND", &[]));
    let err = format_error(decode(&png).unwrap_err());
    assert_eq!(
        *err.kind(),
        FormatErrorInner::InvalidChunkSize {
            chunk: chunk::acTL,
            actual: 7
        }
    );

    let mut png = SIGNATURE.to_vec();
    png.extend(raw_chunk(b"IHDR", &ihdr_data(8, 8)));
    png.extend(raw_chunk(
        b"fcTL",
        &fctl_data(0, 8, 8, 0, 0, 1, 100, 0, 0)[..25],
    ));
    png.extend(raw_chunk(b"IEND", &[]));
    let err = format_error(decode(&png).unwrap_err());
    assert_eq!(
        *err.kind(),
        FormatErrorInner::InvalidChunkSize {
            chunk: chunk::fcTL,
            actual: 25
        }
    );
}

#[test]
fn frame_control_ops_are_validated() {
    let mut png = SIGNATURE.to_vec();
    png.extend(raw_chunk(b"IHDR", &ihdr_data(8, 8)));
    png.extend(raw_chunk(b"fcTL", &fctl_data(0, 8, 8, 0, 0, 1, 100, 9, 0)));
    png.extend(raw_chunk(b"IEND", &[]));
    let err = format_error(decode(&png).unwrap_err());
    assert_eq!(*err.kind(), FormatErrorInner::InvalidDisposeOp(9));

    let mut png = SIGNATURE.to_vec();
    png.extend(raw_chunk(b"IHDR", &ihdr_data(8, 8)));
    png.extend(raw_chunk(b"fcTL", &fctl_data(0, 8, 8, 0, 0, 1, 100, 0, 5)));
    png.extend(raw_chunk(b"IEND", &[]));
    let err = format_error(decode(&png).unwrap_err());
    assert_eq!(*err.kind(), FormatErrorInner::InvalidBlendOp(5));
}
