mod helpers;

use helpers::{name_rdata, MemoryCache, ResponseBuilder};
use hearth_dns_domain::rr::{rcode, rrtype};
use hearth_dns_domain::{DoctorRule, ForwarderConfig, ForwarderOptions, RecordFlags, WireError};
use hearth_dns_wire::{
    answer_request, extract_addresses, LocalAnswer, QueryContext, RecordStore,
};
use std::net::{IpAddr, Ipv4Addr};

const NOW: u64 = 1_000_000;

#[test]
fn test_simple_address_reply_is_cached() {
    let cfg = ForwarderConfig::default();
    let mut cache = MemoryCache::new();
    let mut reply = ResponseBuilder::new("host.example", rrtype::A)
        .answer("host.example", rrtype::A, 600, &[93, 184, 216, 34])
        .build();

    extract_addresses(&mut reply, NOW, &cfg, &mut cache).unwrap();

    let h = cache
        .find_by_name(None, "host.example", NOW, RecordFlags::IPV4)
        .unwrap();
    assert_eq!(
        cache.address_of(h),
        Some(IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34)))
    );
    assert_eq!(cache.time_to_die(h), NOW + 600);
    assert!(cache.flags_of(h).contains(RecordFlags::FORWARD));
}

#[test]
fn test_owner_names_match_case_insensitively() {
    let cfg = ForwarderConfig::default();
    let mut cache = MemoryCache::new();
    let mut reply = ResponseBuilder::new("host.example", rrtype::A)
        .answer("HOST.Example", rrtype::A, 600, &[93, 184, 216, 34])
        .build();

    extract_addresses(&mut reply, NOW, &cfg, &mut cache).unwrap();
    assert!(cache
        .find_by_name(None, "host.example", NOW, RecordFlags::IPV4)
        .is_some());
}

#[test]
fn test_cname_chain_is_cached_with_links() {
    let cfg = ForwarderConfig::default();
    let mut cache = MemoryCache::new();
    let mut reply = ResponseBuilder::new("www.example", rrtype::A)
        .answer("www.example", rrtype::CNAME, 300, &name_rdata("cdn.example"))
        .answer("cdn.example", rrtype::A, 120, &[203, 0, 113, 9])
        .build();

    extract_addresses(&mut reply, NOW, &cfg, &mut cache).unwrap();

    let alias = cache
        .find_by_name(None, "www.example", NOW, RecordFlags::CNAME)
        .unwrap();
    assert!(cache.flags_of(alias).contains(RecordFlags::CNAME));

    let target = cache.cname_target(alias).unwrap();
    assert_eq!(cache.name_of(target), "cdn.example");
    assert_eq!(
        cache.address_of(target),
        Some(IpAddr::V4(Ipv4Addr::new(203, 0, 113, 9)))
    );
}

#[test]
fn test_five_chained_cnames_are_cached_and_linked() {
    let cfg = ForwarderConfig::default();
    let mut cache = MemoryCache::new();
    let mut builder = ResponseBuilder::new("c0.example", rrtype::A);
    for i in 0..5 {
        builder = builder.answer(
            &format!("c{i}.example"),
            rrtype::CNAME,
            300,
            &name_rdata(&format!("c{}.example", i + 1)),
        );
    }
    let mut reply = builder
        .answer("c5.example", rrtype::A, 300, &[198, 51, 100, 1])
        .build();

    extract_addresses(&mut reply, NOW, &cfg, &mut cache).unwrap();

    let mut h = cache
        .find_by_name(None, "c0.example", NOW, RecordFlags::CNAME)
        .unwrap();
    for _ in 0..5 {
        h = cache.cname_target(h).unwrap();
    }
    assert_eq!(
        cache.address_of(h),
        Some(IpAddr::V4(Ipv4Addr::new(198, 51, 100, 1)))
    );
}

#[test]
fn test_six_chained_cnames_are_rejected() {
    let cfg = ForwarderConfig::default();
    let mut cache = MemoryCache::new();
    let mut builder = ResponseBuilder::new("c0.example", rrtype::A);
    for i in 0..6 {
        builder = builder.answer(
            &format!("c{i}.example"),
            rrtype::CNAME,
            300,
            &name_rdata(&format!("c{}.example", i + 1)),
        );
    }
    let mut reply = builder
        .answer("c6.example", rrtype::A, 300, &[198, 51, 100, 2])
        .build();

    let res = extract_addresses(&mut reply, NOW, &cfg, &mut cache);
    assert!(matches!(res, Err(WireError::ChainTooDeep)));
    assert_eq!(cache.len(), 0);
}

#[test]
fn test_looped_cnames_abort_the_insert() {
    let cfg = ForwarderConfig::default();
    let mut cache = MemoryCache::new();
    // a.example -> b.example -> a.example, forever
    let mut reply = ResponseBuilder::new("a.example", rrtype::A)
        .answer("a.example", rrtype::CNAME, 300, &name_rdata("b.example"))
        .answer("b.example", rrtype::CNAME, 300, &name_rdata("a.example"))
        .build();

    let res = extract_addresses(&mut reply, NOW, &cfg, &mut cache);
    assert!(matches!(res, Err(WireError::ChainTooDeep)));
    // nothing from the bad reply may stay behind
    assert_eq!(cache.len(), 0);
}

#[test]
fn test_nxdomain_with_soa_caches_a_negative_entry() {
    let cfg = ForwarderConfig::default();
    let mut cache = MemoryCache::new();
    let mut reply = ResponseBuilder::new("gone.example", rrtype::A)
        .rcode(rcode::NXDOMAIN)
        .authority_soa(3600, 900)
        .build();

    extract_addresses(&mut reply, NOW, &cfg, &mut cache).unwrap();

    let h = cache
        .find_by_name(None, "gone.example", NOW, RecordFlags::IPV4)
        .unwrap();
    let flags = cache.flags_of(h);
    assert!(flags.contains(RecordFlags::NEG));
    assert!(flags.contains(RecordFlags::NXDOMAIN));
    // negative TTL is the smaller of the SOA TTL and its minimum field
    assert_eq!(cache.time_to_die(h), NOW + 900);
}

#[test]
fn test_negative_caching_can_be_disabled() {
    let cfg = ForwarderConfig {
        options: ForwarderOptions {
            negative_cache: false,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut cache = MemoryCache::new();
    let mut reply = ResponseBuilder::new("gone.example", rrtype::A)
        .rcode(rcode::NXDOMAIN)
        .authority_soa(3600, 900)
        .build();

    extract_addresses(&mut reply, NOW, &cfg, &mut cache).unwrap();
    assert_eq!(cache.len(), 0);
}

#[test]
fn test_no_soa_means_no_negative_entry() {
    let cfg = ForwarderConfig::default();
    let mut cache = MemoryCache::new();
    let mut reply = ResponseBuilder::new("gone.example", rrtype::A)
        .rcode(rcode::NXDOMAIN)
        .build();

    extract_addresses(&mut reply, NOW, &cfg, &mut cache).unwrap();
    assert_eq!(cache.len(), 0);
}

#[test]
fn test_ptr_reply_is_cached_under_the_address() {
    let cfg = ForwarderConfig::default();
    let mut cache = MemoryCache::new();
    let mut reply = ResponseBuilder::new("9.1.168.192.in-addr.arpa", rrtype::PTR)
        .answer(
            "9.1.168.192.in-addr.arpa",
            rrtype::PTR,
            300,
            &name_rdata("printer.lan"),
        )
        .build();

    extract_addresses(&mut reply, NOW, &cfg, &mut cache).unwrap();

    let h = cache
        .find_by_addr(
            None,
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 9)),
            NOW,
            RecordFlags::IPV4,
        )
        .unwrap();
    assert_eq!(cache.name_of(h), "printer.lan");
    assert!(cache.flags_of(h).contains(RecordFlags::REVERSE));
}

#[test]
fn test_ptr_chain_uses_minimum_ttl() {
    let cfg = ForwarderConfig::default();
    let mut cache = MemoryCache::new();
    // RFC 2317 style: the reverse name is a CNAME into a delegated zone
    let mut reply = ResponseBuilder::new("9.1.168.192.in-addr.arpa", rrtype::PTR)
        .answer(
            "9.1.168.192.in-addr.arpa",
            rrtype::CNAME,
            60,
            &name_rdata("9.0-24.1.168.192.in-addr.arpa"),
        )
        .answer(
            "9.0-24.1.168.192.in-addr.arpa",
            rrtype::PTR,
            600,
            &name_rdata("printer.lan"),
        )
        .build();

    extract_addresses(&mut reply, NOW, &cfg, &mut cache).unwrap();

    let h = cache
        .find_by_addr(
            None,
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 9)),
            NOW,
            RecordFlags::IPV4,
        )
        .unwrap();
    assert_eq!(cache.name_of(h), "printer.lan");
    assert_eq!(cache.time_to_die(h), NOW + 60);
}

#[test]
fn test_negative_ptr_entry_found_by_address() {
    let cfg = ForwarderConfig::default();
    let mut cache = MemoryCache::new();
    let mut reply = ResponseBuilder::new("9.1.168.192.in-addr.arpa", rrtype::PTR)
        .rcode(rcode::NXDOMAIN)
        .authority_soa(600, 600)
        .build();

    extract_addresses(&mut reply, NOW, &cfg, &mut cache).unwrap();

    let h = cache
        .find_by_addr(
            None,
            IpAddr::V4(Ipv4Addr::new(192, 168, 1, 9)),
            NOW,
            RecordFlags::IPV4,
        )
        .unwrap();
    assert!(cache.flags_of(h).contains(RecordFlags::NEG));
    assert!(cache.flags_of(h).contains(RecordFlags::REVERSE));
}

#[test]
fn test_cached_negative_ptr_replays_as_nxdomain() {
    let cfg = ForwarderConfig::default();
    let mut cache = MemoryCache::new();
    let mut reply = ResponseBuilder::new("9.1.168.192.in-addr.arpa", rrtype::PTR)
        .rcode(rcode::NXDOMAIN)
        .authority_soa(300, 300)
        .build();
    extract_addresses(&mut reply, NOW, &cfg, &mut cache).unwrap();

    // the next query for the same address is answered locally
    let mut q = helpers::query("9.1.168.192.in-addr.arpa", rrtype::PTR);
    let ifs = helpers::no_interfaces();
    let ctx = QueryContext {
        config: &cfg,
        cache: &cache,
        policy: None,
        interfaces: &ifs,
        local_subnet: None,
        now: NOW,
    };
    let res = answer_request(&mut q, 512, &ctx).unwrap();
    assert!(matches!(res, LocalAnswer::Answered(_)));
    assert_eq!(q[3] & 0x0f, rcode::NXDOMAIN);
}

#[test]
fn test_reply_shorter_than_header_is_rejected() {
    let cfg = ForwarderConfig::default();
    let mut cache = MemoryCache::new();
    let mut reply = vec![0u8; 5];

    let res = extract_addresses(&mut reply, NOW, &cfg, &mut cache);
    assert!(matches!(res, Err(WireError::Malformed(_))));
    assert_eq!(cache.len(), 0);
}

#[test]
fn test_malformed_reply_aborts_cleanly() {
    let cfg = ForwarderConfig::default();
    let mut cache = MemoryCache::new();
    let mut reply = ResponseBuilder::new("host.example", rrtype::A)
        .answer("host.example", rrtype::A, 600, &[93, 184, 216, 34])
        .build();
    reply.truncate(reply.len() - 2); // cut into the rdata

    assert!(extract_addresses(&mut reply, NOW, &cfg, &mut cache).is_err());
    assert_eq!(cache.len(), 0);
}

#[test]
fn test_doctor_rewrites_reply_and_cache() {
    let cfg = ForwarderConfig {
        doctors: vec![DoctorRule {
            network: "10.8.0.0/16".parse().unwrap(),
            replace: Ipv4Addr::new(192, 168, 8, 0),
        }],
        ..Default::default()
    };
    let mut cache = MemoryCache::new();
    let mut reply = ResponseBuilder::new("nat.example", rrtype::A)
        .answer("nat.example", rrtype::A, 600, &[10, 8, 1, 9])
        .build();
    reply[2] |= 0x04; // upstream claimed authority

    extract_addresses(&mut reply, NOW, &cfg, &mut cache).unwrap();

    let h = cache
        .find_by_name(None, "nat.example", NOW, RecordFlags::IPV4)
        .unwrap();
    assert_eq!(
        cache.address_of(h),
        Some(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 9)))
    );
    // the reply bytes were rewritten in place and authority dropped
    assert_eq!(&reply[reply.len() - 4..], &[192, 168, 1, 9]);
    assert!(reply[2] & 0x04 == 0);
}

#[test]
fn test_non_in_class_questions_are_ignored() {
    let cfg = ForwarderConfig::default();
    let mut cache = MemoryCache::new();
    let mut reply = ResponseBuilder::new("chaos.example", rrtype::A)
        .answer("chaos.example", rrtype::A, 600, &[1, 2, 3, 4])
        .build();
    // flip the question class to CHAOS: header + encoded name + type
    let name_len = "chaos.example".len() + 2;
    reply[12 + name_len + 3] = 3;

    extract_addresses(&mut reply, NOW, &cfg, &mut cache).unwrap();
    assert_eq!(cache.len(), 0);
}
