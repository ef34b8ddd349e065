use image::{GrayImage, Luma};

use qrforge::{Compression, ECLevel, QRBuilder, QRError, QRMatrix, Version, QR};

fn render(matrix: &QRMatrix, module_size: u32) -> GrayImage {
    let qz = 4 * module_size;
    let qr_size = matrix.side() as u32 * module_size;
    let total = qr_size + 2 * qz;
    GrayImage::from_fn(total, total, |x, y| {
        if x < qz || y < qz || x >= qz + qr_size || y >= qz + qr_size {
            return Luma([255]);
        }
        let r = ((y - qz) / module_size) as usize;
        let c = ((x - qz) / module_size) as usize;
        if matrix.is_dark(r, c) {
            Luma([0])
        } else {
            Luma([255])
        }
    })
}

fn decode(matrix: &QRMatrix) -> (usize, String) {
    let img = render(matrix, 4);
    let mut prepared = rqrr::PreparedImage::prepare(img);
    let grids = prepared.detect_grids();
    assert_eq!(grids.len(), 1, "expected exactly one symbol");
    let (meta, content) = grids[0].decode().unwrap();
    (meta.version.0, content)
}

fn hex(raw: &[u8]) -> String {
    raw.iter().map(|b| format!("{b:02x}")).collect()
}

mod decode_roundtrip_tests {
    use super::*;

    #[test]
    fn test_roundtrip_alphanumeric() {
        let qr = QRBuilder::new("HELLO WORLD").ec_level(ECLevel::Q).build().unwrap();
        let (version, content) = decode(&qr.to_matrix());
        assert_eq!(version, 1);
        assert_eq!(content, "HELLO WORLD");
    }

    #[test]
    fn test_roundtrip_numeric_tails() {
        for data in ["1", "12", "123", "1234", "12345"] {
            let qr = QRBuilder::new(data).ec_level(ECLevel::L).build().unwrap();
            let (version, content) = decode(&qr.to_matrix());
            assert_eq!(version, 1);
            assert_eq!(content, data);
        }
    }

    #[test]
    fn test_roundtrip_byte_mode() {
        let data = "This is a quick test! 123#?";
        let qr = QRBuilder::new(data).ec_level(ECLevel::H).build().unwrap();
        let (version, content) = decode(&qr.to_matrix());
        assert_eq!(version, *qr.version());
        assert_eq!(content, data);
    }

    #[test]
    fn test_roundtrip_forced_version() {
        let qr = QRBuilder::new("ABC")
            .version(Version::Normal(5))
            .ec_level(ECLevel::M)
            .build()
            .unwrap();
        let (version, content) = decode(&qr.to_matrix());
        assert_eq!(version, 5);
        assert_eq!(content, "ABC");
    }

    #[test]
    fn test_roundtrip_max_capacity_v40() {
        let data = "a".repeat(2953);
        let qr = QRBuilder::new(&data).ec_level(ECLevel::L).build().unwrap();
        assert_eq!(qr.version(), Version::Normal(40));
        let (version, content) = decode(&qr.to_matrix());
        assert_eq!(version, 40);
        assert_eq!(content, data);

        let over = "a".repeat(2954);
        let err = QRBuilder::new(&over).ec_level(ECLevel::L).build().unwrap_err();
        assert_eq!(err, QRError::CapacityExceeded);
    }

    // V32 carries nine alignment pattern centers
    #[test]
    fn test_roundtrip_dense_alignment_version() {
        let qr = QRBuilder::new("ALIGNMENT HEAVY")
            .version(Version::Normal(32))
            .ec_level(ECLevel::Q)
            .build()
            .unwrap();
        let (version, content) = decode(&qr.to_matrix());
        assert_eq!(version, 32);
        assert_eq!(content, "ALIGNMENT HEAVY");
    }
}

mod golden_tests {
    use super::*;

    fn fingerprint(qr: &QR) -> String {
        hex(&qr.to_matrix().serialize(Compression::Uncompressed))
    }

    #[test]
    fn test_golden_empty_payload() {
        let qr = QRBuilder::new("").ec_level(ECLevel::M).build().unwrap();
        assert_eq!(qr.version(), Version::Normal(1));
        assert_eq!(*qr.mask_pattern().unwrap(), 4);
        assert_eq!(
            fingerprint(&qr),
            "5152520015fec3fc10506e96bb7545dba8aec14907faafe017008b97cfafcacce4f839cd4128e38\
             0571ffa30104f28bad3fdd1caee9cf9048d6feee380"
        );
    }

    #[test]
    fn test_golden_hello_world() {
        let qr = QRBuilder::new("HELLO WORLD").ec_level(ECLevel::Q).build().unwrap();
        assert_eq!(qr.version(), Version::Normal(1));
        assert_eq!(*qr.mask_pattern().unwrap(), 6);
        assert_eq!(
            fingerprint(&qr),
            "5152520015fe13fc16506e96bb75f5dbad2ec12507faafe01b005eced5e87b8ac4c168b18dfeef8\
             044a3f999f05497bad23dd5c52e908705ce6fe50100"
        );
    }

    #[test]
    fn test_golden_digits() {
        let qr = QRBuilder::new("12345").ec_level(ECLevel::L).build().unwrap();
        assert_eq!(qr.version(), Version::Normal(1));
        assert_eq!(*qr.mask_pattern().unwrap(), 3);
        assert_eq!(
            fingerprint(&qr),
            "5152520015febbfc11906eb4bb7595dba92ec13d07faafe00300f2fceeeff3e69400d02750e2910\
             05927f8e4104436ba6fcdd59faebac1054a7fee4900"
        );
    }

    #[test]
    fn test_golden_byte_mode_bumps_version() {
        let qr =
            QRBuilder::new("This is a quick test! 123#?").ec_level(ECLevel::H).build().unwrap();
        assert_eq!(qr.version(), Version::Normal(4));
        assert_eq!(*qr.mask_pattern().unwrap(), 3);
        assert_eq!(
            fingerprint(&qr),
            "5152520021fe1bbb3fc11bb6d06e94160bb743fb35dbad291aec12537907faaaaafe0172a10033f\
             dffe84e694ff36398a87c269af70082f2164c42ac2e141e4d95fb7980417fa7631a752c2a2355f6\
             68da573c8233ec2225bed84b35aefcf414cbe6d6d6b01ed05a9e8f70fd004fda463fbec56b90453\
             911cba44ebfadd69c7232ea894a8104cf3f05fe542b0000"
        );
    }

    #[test]
    fn test_golden_forced_version() {
        let qr = QRBuilder::new("ABC")
            .version(Version::Normal(5))
            .ec_level(ECLevel::M)
            .build()
            .unwrap();
        assert_eq!(*qr.mask_pattern().unwrap(), 2);
        assert_eq!(
            fingerprint(&qr),
            "5152520025fe7deedbfc128aa3106eb83fb2bb75f33955dbaaca212ec14015cd07faaaaaafe0145\
             02600be202f9be0266c01b26ae10ae6c28289026ca76d2a7120dcdaa67fe78cdf519348a86fd938\
             662b942454c61b76ddf5a175193c28bafd9354fbb1cad53cebd1091ceb40ae6dbd37d026c7334c2\
             f9b4fc28c01b2e19f0ae6c16a51026cbbaaca71f88054a67c67f8cf51ea50516fd918bac9942f95\
             d72b76d16eb0751bfb0466fda94fefb1ca9c80"
        );
    }
}

mod serialization_roundtrip_tests {
    use super::*;

    #[test]
    fn test_serialization_roundtrips_all_schemes() {
        for (data, ecl) in
            [("12345", ECLevel::L), ("HELLO WORLD", ECLevel::Q), ("mixed Content 99", ECLevel::H)]
        {
            let matrix = QRBuilder::new(data).ec_level(ecl).build().unwrap().to_matrix();
            for compression in [Compression::Uncompressed, Compression::Deflate, Compression::Gzip]
            {
                let raw = matrix.serialize(compression);
                let restored = QRMatrix::deserialize(&raw, compression).unwrap();
                assert_eq!(matrix, restored, "{data} {compression:?}");
            }
        }
    }
}

mod qr_proptests {
    use proptest::prelude::*;
    use proptest::string::string_regex;

    use super::*;

    pub fn version_strategy() -> impl Strategy<Value = Version> {
        (1usize..=40).prop_map(Version::Normal)
    }

    pub fn ec_level_strategy() -> BoxedStrategy<ECLevel> {
        prop_oneof![Just(ECLevel::L), Just(ECLevel::M), Just(ECLevel::Q), Just(ECLevel::H)].boxed()
    }

    pub fn qr_strategy() -> impl Strategy<Value = (Version, ECLevel, String)> {
        (version_strategy(), ec_level_strategy()).prop_flat_map(|(ver, ecl)| {
            // Worst case byte mode header at 16 count bits
            let max_len = (ver.data_bit_capacity(ecl) - 20) / 8;
            let pattern = format!(r"[ -~]{{1,{max_len}}}");
            string_regex(&pattern).unwrap().prop_map(move |data| (ver, ecl, data))
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn proptest_qr_roundtrip(params in qr_strategy()) {
            let (ver, ecl, data) = params;
            let qr = QRBuilder::new(&data).version(ver).ec_level(ecl).build().unwrap();
            prop_assert_eq!(qr.width(), *ver * 4 + 17);
            let (version, content) = decode(&qr.to_matrix());
            prop_assert_eq!(version, *ver);
            prop_assert_eq!(content, data);
        }

        #[test]
        fn proptest_serialization_roundtrip(params in qr_strategy()) {
            let (ver, ecl, data) = params;
            let matrix =
                QRBuilder::new(&data).version(ver).ec_level(ecl).build().unwrap().to_matrix();
            let raw = matrix.serialize(Compression::Deflate);
            let restored = QRMatrix::deserialize(&raw, Compression::Deflate).unwrap();
            prop_assert_eq!(matrix, restored);
        }
    }
}
